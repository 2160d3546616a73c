/// 從已排序資料切出目前要顯示的視窗。純切片，不觸發任何抓取。
pub fn window<T>(sorted: &[T], offset: usize, page_size: usize) -> &[T] {
    let start = offset.min(sorted.len());
    let end = start.saturating_add(page_size).min(sorted.len());
    &sorted[start..end]
}

/// 把 offset 限制在 [0, max(0, total - 1)]
pub fn clamp_offset(offset: usize, total: usize) -> usize {
    offset.min(total.saturating_sub(1))
}

pub fn has_prev(offset: usize) -> bool {
    offset > 0
}

pub fn has_next(offset: usize, page_size: usize, total: usize) -> bool {
    offset.saturating_add(page_size) < total
}

pub fn prev_offset(offset: usize, page_size: usize) -> usize {
    offset.saturating_sub(page_size)
}

/// 已在最後一頁時維持原 offset
pub fn next_offset(offset: usize, page_size: usize, total: usize) -> usize {
    if has_next(offset, page_size, total) {
        offset + page_size
    } else {
        offset
    }
}
