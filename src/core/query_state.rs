use crate::core::units::UnitConverter;
use crate::domain::model::{QueryState, UpstreamQuery};

/// 上游只用來分頁的固定排序欄位，真正的排序在本地完成
pub const SOURCE_ORDER_BY: &str = "points";

/// 持有 draft（編輯中）與 applied（生效中）兩份快照
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterStateManager {
    draft: QueryState,
    applied: QueryState,
}

impl FilterStateManager {
    pub fn new(initial: QueryState) -> Self {
        Self {
            draft: initial.clone(),
            applied: initial,
        }
    }

    pub fn draft(&self) -> &QueryState {
        &self.draft
    }

    pub fn applied(&self) -> &QueryState {
        &self.applied
    }

    pub fn set_draft(&mut self, draft: QueryState) {
        self.draft = draft;
    }

    pub fn edit_draft(&mut self, edit: impl FnOnce(&mut QueryState)) {
        let mut next = self.draft.clone();
        edit(&mut next);
        self.draft = next;
    }

    /// 把 draft 提升為 applied，回傳新的 applied 快照
    pub fn apply(&mut self) -> QueryState {
        self.applied = self.draft.clone();
        self.applied.clone()
    }

    pub fn changed_fields(&self) -> Vec<&'static str> {
        changed_fields(&self.draft, &self.applied)
    }

    pub fn has_unapplied_changes(&self) -> bool {
        !self.changed_fields().is_empty()
    }
}

/// 逐欄位比較兩份快照
pub fn changed_fields(draft: &QueryState, applied: &QueryState) -> Vec<&'static str> {
    let mut changed = Vec::new();
    if draft.period_id != applied.period_id {
        changed.push("period_id");
    }
    if draft.category != applied.category {
        changed.push("category");
    }
    if draft.status != applied.status {
        changed.push("status");
    }
    if draft.group_id != applied.group_id {
        changed.push("group_id");
    }
    if draft.cost_ceiling != applied.cost_ceiling {
        changed.push("cost_ceiling");
    }
    if draft.score_floor != applied.score_floor {
        changed.push("score_floor");
    }
    if draft.model_name != applied.model_name {
        changed.push("model_name");
    }
    if draft.page_size != applied.page_size {
        changed.push("page_size");
    }
    if draft.sort_key != applied.sort_key {
        changed.push("sort_key");
    }
    if draft.sort_direction != applied.sort_direction {
        changed.push("sort_direction");
    }
    changed
}

/// 從 applied 快照建立上游查詢。limit 固定為 chunk 大小，排序欄位固定。
pub fn build_upstream_query(
    applied: &QueryState,
    chunk_size: usize,
    converter: &UnitConverter,
) -> UpstreamQuery {
    UpstreamQuery {
        period_id: applied.period_id,
        limit: chunk_size,
        offset: 0,
        order_by: SOURCE_ORDER_BY.to_string(),
        category: non_empty(&applied.category),
        status: non_empty(&applied.status),
        group_id: applied.group_id,
        max_cost_native: applied.cost_ceiling.map(|c| converter.to_native(c)),
        score_floor: applied.score_floor,
        model_name: non_empty(&applied.model_name),
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
