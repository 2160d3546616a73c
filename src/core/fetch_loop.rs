use crate::domain::model::{Record, UpstreamQuery};
use crate::domain::ports::PredictionSource;
use crate::utils::error::ExplorerError;

/// 一次完整抓取的結果
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    /// 依抵達順序合併的記錄
    pub records: Vec<Record>,
    pub declared_total: Option<usize>,
    /// 觸及安全上限而中止；資料有效但可能不完整
    pub truncated: bool,
    pub chunks_fetched: usize,
}

impl FetchOutcome {
    pub fn total_count(&self) -> usize {
        self.declared_total.unwrap_or(self.records.len())
    }
}

/// 某個 chunk 失敗時中止整個迴圈
#[derive(Debug)]
pub struct FetchFailure {
    pub error: ExplorerError,
    pub offset: usize,
    /// 失敗前已成功取得的 chunk 數
    pub chunks_completed: usize,
}

impl FetchFailure {
    pub fn on_first_chunk(&self) -> bool {
        self.chunks_completed == 0
    }
}

/// 以固定 chunk 大小依序向上游分頁取資料，直到取完或觸及安全上限
pub struct PagedFetcher<'a, S: PredictionSource + ?Sized> {
    source: &'a S,
    chunk_size: usize,
    max_offset: usize,
}

impl<'a, S: PredictionSource + ?Sized> PagedFetcher<'a, S> {
    pub fn new(source: &'a S, chunk_size: usize, max_offset: usize) -> Self {
        Self {
            source,
            chunk_size: chunk_size.max(1),
            max_offset,
        }
    }

    /// 依序抓取。請求不會重疊，合併順序即抵達順序。
    pub async fn fetch_all(&self, base: &UpstreamQuery) -> Result<FetchOutcome, FetchFailure> {
        let mut offset = 0usize;
        let mut outcome = FetchOutcome::default();

        loop {
            let mut query = base.at_offset(offset);
            query.limit = self.chunk_size;

            tracing::debug!(
                "📡 Requesting chunk #{} (offset={}, limit={})",
                outcome.chunks_fetched + 1,
                offset,
                self.chunk_size
            );

            let page = self
                .source
                .fetch_page(&query)
                .await
                .map_err(|error| FetchFailure {
                    error,
                    offset,
                    chunks_completed: outcome.chunks_fetched,
                })?;

            outcome.chunks_fetched += 1;
            let returned = page.records.len();
            outcome.records.extend(page.records);
            if page.total.is_some() {
                outcome.declared_total = page.total;
            }

            tracing::debug!(
                "📥 Chunk at offset {} returned {} records (merged={}, declared_total={:?})",
                offset,
                returned,
                outcome.records.len(),
                outcome.declared_total
            );

            if let Some(total) = outcome.declared_total {
                if outcome.records.len() >= total {
                    break;
                }
            }

            if returned < self.chunk_size {
                break;
            }

            if offset > self.max_offset {
                tracing::warn!(
                    "⚠️ Safety bound reached at offset {} (max_offset={}), dataset truncated at {} records",
                    offset,
                    self.max_offset,
                    outcome.records.len()
                );
                outcome.truncated = true;
                break;
            }

            offset += self.chunk_size;
        }

        tracing::info!(
            "✅ Fetched {} records in {} chunks{}",
            outcome.records.len(),
            outcome.chunks_fetched,
            if outcome.truncated { " (truncated)" } else { "" }
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::SourcePage;
    use crate::utils::error::Result;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// 依呼叫順序回傳預先排好的頁面大小
    struct ScriptedSource {
        page_sizes: Vec<usize>,
        total: Option<usize>,
        /// 依呼叫順序覆寫回報的總數
        totals: Vec<Option<usize>>,
        fail_on_call: Option<usize>,
        seen: Mutex<Vec<UpstreamQuery>>,
    }

    impl ScriptedSource {
        fn new(page_sizes: Vec<usize>) -> Self {
            Self {
                page_sizes,
                total: None,
                totals: Vec::new(),
                fail_on_call: None,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn with_total(mut self, total: usize) -> Self {
            self.total = Some(total);
            self
        }

        fn with_totals(mut self, totals: Vec<Option<usize>>) -> Self {
            self.totals = totals;
            self
        }

        fn failing_on(mut self, call: usize) -> Self {
            self.fail_on_call = Some(call);
            self
        }

        fn calls(&self) -> Vec<UpstreamQuery> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl PredictionSource for ScriptedSource {
        async fn fetch_page(&self, query: &UpstreamQuery) -> Result<SourcePage> {
            let call = {
                let mut seen = self.seen.lock().unwrap();
                seen.push(query.clone());
                seen.len() - 1
            };

            if self.fail_on_call == Some(call) {
                return Err(ExplorerError::upstream("Internal Server Error", Some(500)));
            }

            let size = self
                .page_sizes
                .get(call)
                .copied()
                .unwrap_or_else(|| *self.page_sizes.last().unwrap_or(&0));
            let records = (0..size)
                .map(|i| {
                    let mut data = HashMap::new();
                    data.insert("id".to_string(), serde_json::json!(query.offset + i));
                    Record::new(data)
                })
                .collect();

            Ok(SourcePage {
                records,
                total: self.totals.get(call).copied().unwrap_or(self.total),
            })
        }
    }

    fn base_query() -> UpstreamQuery {
        UpstreamQuery {
            period_id: 5,
            limit: 0,
            offset: 0,
            order_by: "points".to_string(),
            category: None,
            status: None,
            group_id: None,
            max_cost_native: None,
            score_floor: None,
            model_name: None,
        }
    }

    #[tokio::test]
    async fn test_short_page_terminates_loop() {
        let c = 10;
        let source = ScriptedSource::new(vec![c, c, c, c - 1]);
        let fetcher = PagedFetcher::new(&source, c, 1_000);

        let outcome = fetcher.fetch_all(&base_query()).await.unwrap();

        assert_eq!(source.calls().len(), 4);
        assert_eq!(outcome.records.len(), 4 * c - 1);
        assert_eq!(outcome.chunks_fetched, 4);
        assert!(!outcome.truncated);
        assert_eq!(outcome.total_count(), 4 * c - 1);
    }

    #[tokio::test]
    async fn test_requests_use_fixed_chunk_and_increasing_offsets() {
        let source = ScriptedSource::new(vec![3, 3, 1]);
        let fetcher = PagedFetcher::new(&source, 3, 1_000);

        fetcher.fetch_all(&base_query()).await.unwrap();

        let calls = source.calls();
        let offsets: Vec<usize> = calls.iter().map(|q| q.offset).collect();
        assert_eq!(offsets, vec![0, 3, 6]);
        assert!(calls.iter().all(|q| q.limit == 3 && q.period_id == 5));
    }

    #[tokio::test]
    async fn test_declared_total_stops_before_short_page() {
        let source = ScriptedSource::new(vec![5, 5, 5]).with_total(10);
        let fetcher = PagedFetcher::new(&source, 5, 1_000);

        let outcome = fetcher.fetch_all(&base_query()).await.unwrap();

        assert_eq!(source.calls().len(), 2);
        assert_eq!(outcome.records.len(), 10);
        assert_eq!(outcome.declared_total, Some(10));
        assert!(!outcome.truncated);
    }

    #[tokio::test]
    async fn test_declared_total_is_reported_even_when_larger() {
        let source = ScriptedSource::new(vec![5, 2]).with_total(40);
        let fetcher = PagedFetcher::new(&source, 5, 1_000);

        let outcome = fetcher.fetch_all(&base_query()).await.unwrap();

        assert_eq!(outcome.records.len(), 7);
        assert_eq!(outcome.total_count(), 40);
    }

    #[tokio::test]
    async fn test_latest_declared_total_wins() {
        let source =
            ScriptedSource::new(vec![5, 5, 5, 5]).with_totals(vec![Some(30), Some(12), None]);
        let fetcher = PagedFetcher::new(&source, 5, 1_000);

        let outcome = fetcher.fetch_all(&base_query()).await.unwrap();

        // 第三頁沒有總數，沿用第二頁的 12
        assert_eq!(source.calls().len(), 3);
        assert_eq!(outcome.records.len(), 15);
        assert_eq!(outcome.declared_total, Some(12));
        assert_eq!(outcome.total_count(), 12);
    }

    #[tokio::test]
    async fn test_shrinking_total_stops_loop_early() {
        let source = ScriptedSource::new(vec![5, 5, 5]).with_totals(vec![Some(50), Some(8)]);
        let fetcher = PagedFetcher::new(&source, 5, 1_000);

        let outcome = fetcher.fetch_all(&base_query()).await.unwrap();

        assert_eq!(source.calls().len(), 2);
        assert_eq!(outcome.records.len(), 10);
        assert_eq!(outcome.total_count(), 8);
        assert!(!outcome.truncated);
    }

    #[tokio::test]
    async fn test_full_pages_without_total_hit_safety_bound() {
        let source = ScriptedSource::new(vec![10]);
        let fetcher = PagedFetcher::new(&source, 10, 25);

        let outcome = fetcher.fetch_all(&base_query()).await.unwrap();

        // offsets 0, 10, 20, 30 -> 30 > 25 stops
        assert_eq!(source.calls().len(), 4);
        assert_eq!(outcome.records.len(), 40);
        assert!(outcome.truncated);
    }

    #[tokio::test]
    async fn test_empty_first_page_is_complete() {
        let source = ScriptedSource::new(vec![0]);
        let fetcher = PagedFetcher::new(&source, 10, 100);

        let outcome = fetcher.fetch_all(&base_query()).await.unwrap();

        assert_eq!(source.calls().len(), 1);
        assert!(outcome.records.is_empty());
        assert!(!outcome.truncated);
    }

    #[tokio::test]
    async fn test_chunk_failure_aborts_loop() {
        let source = ScriptedSource::new(vec![4, 4, 4]).failing_on(1);
        let fetcher = PagedFetcher::new(&source, 4, 100);

        let failure = fetcher.fetch_all(&base_query()).await.unwrap_err();

        assert_eq!(source.calls().len(), 2);
        assert_eq!(failure.offset, 4);
        assert_eq!(failure.chunks_completed, 1);
        assert!(!failure.on_first_chunk());
        assert_eq!(failure.error.status_code(), Some(500));
    }

    #[tokio::test]
    async fn test_first_chunk_failure_is_flagged() {
        let source = ScriptedSource::new(vec![4]).failing_on(0);
        let fetcher = PagedFetcher::new(&source, 4, 100);

        let failure = fetcher.fetch_all(&base_query()).await.unwrap_err();
        assert!(failure.on_first_chunk());
    }
}
