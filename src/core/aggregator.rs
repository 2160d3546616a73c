use crate::core::fetch_loop::PagedFetcher;
use crate::core::normalizer::RowNormalizer;
use crate::core::query_state::{build_upstream_query, FilterStateManager};
use crate::core::sort::sorted_order;
use crate::core::units::UnitConverter;
use crate::core::window;
use crate::domain::model::{
    AggregatedDataset, AggregationSettings, NormalizedRow, QueryState, SortDirection, SortKey,
};
use crate::domain::ports::PredictionSource;
use chrono::Utc;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

/// 目前顯示的視窗
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Page {
    pub rows: Vec<NormalizedRow>,
    pub window_start: usize,
    /// 不含
    pub window_end: usize,
    pub total: usize,
    pub truncated: bool,
    pub has_prev: bool,
    pub has_next: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionStatus {
    pub loading: bool,
    pub error: Option<String>,
    pub error_status: Option<u16>,
    pub has_fetched_once: bool,
    pub truncated: bool,
}

/// 一次 apply 的結果
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    Committed {
        generation: u64,
        rows: usize,
        total: usize,
        truncated: bool,
    },
    /// 較新的 apply 已開始，本次結果被丟棄
    Superseded { generation: u64 },
    Failed {
        generation: u64,
        message: String,
        status: Option<u16>,
    },
}

#[derive(Debug)]
struct SortCache {
    generation: u64,
    key: SortKey,
    direction: SortDirection,
    order: Vec<usize>,
}

#[derive(Debug, Default)]
struct Session {
    filters: FilterStateManager,
    /// 產生目前資料集的那份 applied 快照，排序與視窗大小以此為準
    view: QueryState,
    dataset: Option<AggregatedDataset>,
    offset: usize,
    loading: bool,
    error: Option<String>,
    error_status: Option<u16>,
    has_fetched_once: bool,
    sort_cache: Option<SortCache>,
}

impl Session {
    fn row_count(&self) -> usize {
        self.dataset.as_ref().map(|d| d.rows.len()).unwrap_or(0)
    }

    /// 資料集或排序條件變了才重新排序
    fn refresh_sort(&mut self) {
        let (key, direction) = (self.view.sort_key, self.view.sort_direction);
        let generation = self.dataset.as_ref().map(|d| d.generation).unwrap_or(0);

        let stale = !matches!(
            &self.sort_cache,
            Some(c) if c.generation == generation && c.key == key && c.direction == direction
        );
        if stale {
            let order = self
                .dataset
                .as_ref()
                .map(|d| sorted_order(&d.rows, key, direction))
                .unwrap_or_default();
            self.sort_cache = Some(SortCache {
                generation,
                key,
                direction,
                order,
            });
        }
    }

    fn order(&self) -> &[usize] {
        self.sort_cache
            .as_ref()
            .map(|c| c.order.as_slice())
            .unwrap_or(&[])
    }

    /// 依排序順序從 offset 起取出最多 len 列
    fn sorted_slice(&self, offset: usize, len: usize) -> Vec<NormalizedRow> {
        match self.dataset.as_ref() {
            Some(dataset) => window::window(self.order(), offset, len)
                .iter()
                .map(|&i| dataset.rows[i].clone())
                .collect(),
            None => Vec::new(),
        }
    }
}

/// 分頁來源聚合器：抓取完整資料集後在本地排序、切視窗
pub struct Aggregator<S: PredictionSource> {
    source: S,
    settings: AggregationSettings,
    normalizer: RowNormalizer,
    generation: AtomicU64,
    session: Mutex<Session>,
}

impl<S: PredictionSource> Aggregator<S> {
    pub fn new(source: S, settings: AggregationSettings) -> Self {
        Self::with_initial_state(source, settings, QueryState::default())
    }

    pub fn with_initial_state(source: S, settings: AggregationSettings, initial: QueryState) -> Self {
        let converter = UnitConverter::new(settings.cost_unit_ratio);
        Self {
            source,
            settings,
            normalizer: RowNormalizer::with_converter(converter),
            generation: AtomicU64::new(0),
            session: Mutex::new(Session {
                filters: FilterStateManager::new(initial.clone()),
                view: initial,
                ..Default::default()
            }),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn settings(&self) -> &AggregationSettings {
        &self.settings
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn draft(&self) -> QueryState {
        self.lock().filters.draft().clone()
    }

    pub fn applied(&self) -> QueryState {
        self.lock().filters.applied().clone()
    }

    pub fn edit_draft(&self, edit: impl FnOnce(&mut QueryState)) {
        self.lock().filters.edit_draft(edit);
    }

    pub fn has_unapplied_changes(&self) -> bool {
        self.lock().filters.has_unapplied_changes()
    }

    /// 套用目前的 draft
    pub async fn apply_draft(&self) -> ApplyOutcome {
        let draft = self.draft();
        self.apply_filters(draft).await
    }

    /// 套用篩選條件並重新抓取完整資料集。
    /// 每次呼叫都會取得新的 generation，只有最新的 generation 能寫回結果。
    pub async fn apply_filters(&self, draft: QueryState) -> ApplyOutcome {
        let (generation, applied) = {
            let mut session = self.lock();
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            session.filters.set_draft(draft);
            let applied = session.filters.apply();
            session.loading = true;
            (generation, applied)
        };

        tracing::info!(
            "🔄 Applying filters (generation {}): period={}, category={:?}, status={:?}, group={:?}",
            generation,
            applied.period_id,
            applied.category,
            applied.status,
            applied.group_id
        );

        let query = build_upstream_query(
            &applied,
            self.settings.chunk_size,
            self.normalizer.converter(),
        );
        let fetcher = PagedFetcher::new(
            &self.source,
            self.settings.chunk_size,
            self.settings.max_offset,
        );
        let result = fetcher.fetch_all(&query).await;

        let mut session = self.lock();
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(
                "🗑️ Discarding result of superseded generation {}",
                generation
            );
            return ApplyOutcome::Superseded { generation };
        }

        session.loading = false;
        session.has_fetched_once = true;

        match result {
            Ok(outcome) => {
                let rows = self.normalizer.normalize_all(&outcome.records);
                let total = outcome.total_count();
                if outcome.truncated && self.settings.warn_on_truncation {
                    tracing::warn!(
                        "⚠️ Dataset truncated at {} rows; total {} is a lower bound",
                        rows.len(),
                        total
                    );
                }

                let committed = ApplyOutcome::Committed {
                    generation,
                    rows: rows.len(),
                    total,
                    truncated: outcome.truncated,
                };
                session.dataset = Some(AggregatedDataset {
                    generation,
                    rows,
                    total_count: total,
                    truncated: outcome.truncated,
                    fetched_at: Utc::now(),
                });
                session.view = applied;
                session.offset = 0;
                session.error = None;
                session.error_status = None;
                session.sort_cache = None;
                committed
            }
            Err(failure) => {
                let message = failure.error.user_friendly_message();
                let status = failure.error.status_code();
                tracing::error!(
                    "❌ Fetch failed at offset {} after {} chunks: {}",
                    failure.offset,
                    failure.chunks_completed,
                    failure.error
                );

                // 第一個 chunk 就失敗時清空；否則保留先前的資料集
                if failure.on_first_chunk() {
                    session.dataset = Some(AggregatedDataset::empty(generation));
                    session.view = applied;
                    session.offset = 0;
                    session.sort_cache = None;
                }
                session.error = Some(message.clone());
                session.error_status = status;

                ApplyOutcome::Failed {
                    generation,
                    message,
                    status,
                }
            }
        }
    }

    /// 跳到指定 offset，純粹切視窗，不會抓取。回傳實際採用的 offset。
    pub fn go_to_offset(&self, new_offset: usize) -> usize {
        let mut session = self.lock();
        let clamped = window::clamp_offset(new_offset, session.row_count());
        session.offset = clamped;
        clamped
    }

    pub fn next_page(&self) -> usize {
        let mut session = self.lock();
        let page_size = session.view.page_size;
        session.offset = window::next_offset(session.offset, page_size, session.row_count());
        session.offset
    }

    pub fn prev_page(&self) -> usize {
        let mut session = self.lock();
        let page_size = session.view.page_size;
        session.offset = window::prev_offset(session.offset, page_size);
        session.offset
    }

    pub fn current_page(&self) -> Page {
        let mut session = self.lock();
        session.refresh_sort();

        let offset = session.offset;
        let page_size = session.view.page_size;
        let row_count = session.row_count();
        let rows = session.sorted_slice(offset, page_size);
        let (total, truncated) = session
            .dataset
            .as_ref()
            .map(|d| (d.total_count, d.truncated))
            .unwrap_or((0, false));

        Page {
            window_start: offset,
            window_end: offset + rows.len(),
            rows,
            total,
            truncated,
            has_prev: window::has_prev(offset),
            has_next: window::has_next(offset, page_size, row_count),
        }
    }

    /// 依目前排序條件排好的完整資料集
    pub fn sorted_rows(&self) -> Vec<NormalizedRow> {
        let mut session = self.lock();
        session.refresh_sort();
        let row_count = session.row_count();
        session.sorted_slice(0, row_count)
    }

    pub fn dataset(&self) -> Option<AggregatedDataset> {
        self.lock().dataset.clone()
    }

    pub fn status(&self) -> SessionStatus {
        let session = self.lock();
        SessionStatus {
            loading: session.loading,
            error: session.error.clone(),
            error_status: session.error_status,
            has_fetched_once: session.has_fetched_once,
            truncated: session.dataset.as_ref().map(|d| d.truncated).unwrap_or(false),
        }
    }
}
