use crate::domain::model::{NormalizedRow, SortDirection, SortKey};
use std::cmp::Ordering;

/// 對合併後的完整資料集排序，回傳索引順序，不動原本的抵達順序。
///
/// 缺值視為最小值：升冪排在最前，降冪排在最後。
/// 使用穩定排序，同值時保留抵達順序。
pub fn sorted_order(rows: &[NormalizedRow], key: SortKey, direction: SortDirection) -> Vec<usize> {
    let mut order: Vec<usize> = (0..rows.len()).collect();
    order.sort_by(|&a, &b| {
        let ordering = compare_nullable(rows[a].sort_value(key), rows[b].sort_value(key));
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
    order
}

pub fn global_sort<'a>(
    rows: &'a [NormalizedRow],
    key: SortKey,
    direction: SortDirection,
) -> Vec<&'a NormalizedRow> {
    sorted_order(rows, key, direction)
        .into_iter()
        .map(|i| &rows[i])
        .collect()
}

fn compare_nullable(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => x.total_cmp(&y),
    }
}
