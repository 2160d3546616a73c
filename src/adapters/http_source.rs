use crate::domain::model::{Record, SourcePage, UpstreamQuery};
use crate::domain::ports::{ConfigProvider, PredictionSource};
use crate::utils::error::{ExplorerError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// 上游可能把陣列包在這些欄位底下
const CONTAINER_FIELDS: &[&str] = &["rows", "items", "data", "results", "predictions", "players"];
/// total 放在這些欄位的 `total` 底下
const META_FIELDS: &[&str] = &["meta", "metadata"];
const PREVIEW_CHARS: usize = 300;

/// 透過 HTTP 查詢預測 API 的資料來源
pub struct HttpPredictionSource {
    client: Client,
    endpoint: String,
    headers: HashMap<String, String>,
    timeout: Option<Duration>,
}

impl HttpPredictionSource {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            headers: HashMap::new(),
            timeout: None,
        }
    }

    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Self {
        Self::new(config.api_endpoint())
            .with_headers(config.headers())
            .with_timeout(config.request_timeout_seconds().map(Duration::from_secs))
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// 把查詢轉成上游的 query string 參數
pub fn query_pairs(query: &UpstreamQuery) -> Vec<(&'static str, String)> {
    let mut pairs = vec![
        ("target_gw", query.period_id.to_string()),
        ("limit", query.limit.to_string()),
        ("offset", query.offset.to_string()),
        ("order_by", query.order_by.clone()),
    ];
    if let Some(category) = &query.category {
        pairs.push(("position", category.clone()));
    }
    if let Some(status) = &query.status {
        pairs.push(("status", status.clone()));
    }
    if let Some(group_id) = query.group_id {
        pairs.push(("team_id", group_id.to_string()));
    }
    if let Some(max_cost) = query.max_cost_native {
        pairs.push(("max_cost", max_cost.to_string()));
    }
    if let Some(score_floor) = query.score_floor {
        pairs.push(("min_predicted_points", score_floor.to_string()));
    }
    if let Some(model_name) = &query.model_name {
        pairs.push(("model_name", model_name.clone()));
    }
    pairs
}

fn preview(body: &str) -> String {
    let mut text: String = body.chars().take(PREVIEW_CHARS).collect();
    if body.chars().count() > PREVIEW_CHARS {
        text.push('…');
    }
    text
}

/// 從錯誤回應中找出可讀訊息（FastAPI 的 `detail` 或自訂的 `error`）
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["detail", "error", "message"]
        .iter()
        .filter_map(|key| value.get(key))
        .find_map(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        })
}

/// 解析上游回應內容：陣列本身，或包在已知容器欄位中的陣列
pub fn parse_page(value: Value, status: u16, url: &str) -> Result<SourcePage> {
    match value {
        Value::Array(items) => Ok(SourcePage {
            records: into_records(items),
            total: None,
        }),
        Value::Object(obj) => {
            let container = CONTAINER_FIELDS
                .iter()
                .find_map(|field| obj.get(*field).and_then(Value::as_array));

            let Some(items) = container else {
                if let Some(message) = obj.get("error").and_then(Value::as_str) {
                    return Err(ExplorerError::upstream(message, Some(status)));
                }
                return Err(ExplorerError::UpstreamFormatError {
                    status,
                    url: url.to_string(),
                    preview: preview(&serde_json::to_string(&obj).unwrap_or_default()),
                });
            };

            let total = META_FIELDS
                .iter()
                .filter_map(|field| obj.get(*field))
                .find_map(|meta| meta.get("total"))
                .and_then(Value::as_u64)
                .map(|t| t as usize);

            Ok(SourcePage {
                records: into_records(items.clone()),
                total,
            })
        }
        other => Err(ExplorerError::UpstreamFormatError {
            status,
            url: url.to_string(),
            preview: preview(&other.to_string()),
        }),
    }
}

fn into_records(items: Vec<Value>) -> Vec<Record> {
    let mut skipped = 0usize;
    let records: Vec<Record> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(obj) => Some(Record::from_json_object(obj)),
            _ => {
                skipped += 1;
                None
            }
        })
        .collect();
    if skipped > 0 {
        tracing::warn!("⚠️ Skipped {} non-object items in upstream response", skipped);
    }
    records
}

#[async_trait]
impl PredictionSource for HttpPredictionSource {
    async fn fetch_page(&self, query: &UpstreamQuery) -> Result<SourcePage> {
        let mut request = self.client.get(&self.endpoint).query(&query_pairs(query));

        for (key, value) in &self.headers {
            request = request.header(key, value);
        }

        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        tracing::debug!(
            "Making API request to: {} (offset={}, limit={})",
            self.endpoint,
            query.offset,
            query.limit
        );

        let response = request
            .send()
            .await
            .map_err(|e| ExplorerError::upstream(e.to_string(), e.status().map(|s| s.as_u16())))?;

        let status = response.status();
        let url = response.url().to_string();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();
        tracing::debug!("API response status: {} ({})", status, content_type);

        let body = response
            .text()
            .await
            .map_err(|e| ExplorerError::upstream(e.to_string(), Some(status.as_u16())))?;

        if !status.is_success() {
            let message = error_message(&body).unwrap_or_else(|| {
                format!(
                    "{} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("error")
                )
            });
            return Err(ExplorerError::upstream(message, Some(status.as_u16())));
        }

        if !content_type.contains("json") {
            return Err(ExplorerError::UpstreamFormatError {
                status: status.as_u16(),
                url,
                preview: preview(&body),
            });
        }

        let value: Value =
            serde_json::from_str(&body).map_err(|_| ExplorerError::UpstreamFormatError {
                status: status.as_u16(),
                url: url.clone(),
                preview: preview(&body),
            })?;

        parse_page(value, status.as_u16(), &url)
    }
}
