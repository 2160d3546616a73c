use crate::domain::model::{SourcePage, UpstreamQuery};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// 分頁受限的上游資料來源
#[async_trait]
pub trait PredictionSource: Send + Sync {
    async fn fetch_page(&self, query: &UpstreamQuery) -> Result<SourcePage>;
}

pub trait ConfigProvider: Send + Sync {
    fn api_endpoint(&self) -> &str;
    fn request_timeout_seconds(&self) -> Option<u64>;
    fn headers(&self) -> HashMap<String, String>;
}
