use std::time::Duration;

use rand::Rng;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, info, warn};

use crate::http::request::{Request, RequestBody};
use crate::http::response::Response;
use crate::http::types::Method;
use crate::{ApicaseError, Result};

/// 触发重试的状态码，与限流/网关类故障对应
const RETRY_STATUS: [u16; 5] = [429, 500, 502, 503, 504];

/// HTTP 客户端，带超时和有限重试
#[derive(Clone)]
pub struct Client {
    inner: reqwest::Client,
    max_retries: u32,
}

impl Client {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_RETRIES: u32 = 3;

    pub fn new(timeout: Duration, max_retries: u32) -> Result<Self> {
        let inner = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            inner,
            max_retries,
        })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(Self::DEFAULT_TIMEOUT, Self::DEFAULT_RETRIES)
    }

    /// 发送请求，429/5xx 和连接类错误按指数退避重试
    pub async fn execute(&self, request: &Request) -> Result<Response> {
        info!("请求: {} {}", request.method, request.full_url());
        info!("Curl: {}", request.to_curl());

        let mut attempt: u32 = 0;
        loop {
            match self.send_once(request).await {
                Ok(response) => {
                    let code = response.status.code();
                    if RETRY_STATUS.contains(&code) && attempt < self.max_retries {
                        let delay = backoff_delay(attempt);
                        warn!(
                            "收到状态码 {}，{}ms 后重试 ({}/{})",
                            code,
                            delay.as_millis(),
                            attempt + 1,
                            self.max_retries
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    info!(
                        "响应: {} {} 耗时 {}ms",
                        code,
                        response.status.reason_phrase(),
                        response.duration.as_millis()
                    );
                    debug!("响应体: {}", response.body);
                    return Ok(response);
                }
                Err(e) if attempt < self.max_retries && is_retryable(&e) => {
                    let delay = backoff_delay(attempt);
                    warn!(
                        "请求失败: {}，{}ms 后重试 ({}/{})",
                        e,
                        delay.as_millis(),
                        attempt + 1,
                        self.max_retries
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_once(&self, request: &Request) -> Result<Response> {
        let url = reqwest::Url::parse_with_params(&request.url, &request.query_params)?;
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
            Method::Patch => reqwest::Method::PATCH,
            Method::Head => reqwest::Method::HEAD,
            Method::Options => reqwest::Method::OPTIONS,
        };

        let mut req = self
            .inner
            .request(method, url)
            .headers(build_header_map(&request.headers)?);

        if let Some(body) = render_body(&request.body)? {
            req = req.body(body);
        }

        let start = std::time::Instant::now();
        let response = req.send().await?;
        let duration = start.elapsed();

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.text().await?;

        Response::new(status, headers, body, duration)
    }
}

/// 请求体按 RequestBody 模式渲染为字符串
fn render_body(body: &Option<RequestBody>) -> Result<Option<String>> {
    match body {
        Some(RequestBody::Json(value)) => Ok(Some(serde_json::to_string(value)?)),
        Some(RequestBody::Form(fields)) => {
            let encoded = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(fields.iter().map(|(k, v)| (k, v)))
                .finish();
            Ok(Some(encoded))
        }
        Some(RequestBody::Text(text)) => Ok(Some(text.clone())),
        None => Ok(None),
    }
}

fn build_header_map(headers: &[(String, String)]) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| ApicaseError::ParseError(format!("Invalid header name {}: {}", key, e)))?;
        let value = HeaderValue::from_str(value).map_err(|e| {
            ApicaseError::ParseError(format!("Invalid header value for {}: {}", key, e))
        })?;
        map.insert(name, value);
    }
    Ok(map)
}

/// 指数退避加随机抖动
fn backoff_delay(attempt: u32) -> Duration {
    let base = 500u64.saturating_mul(1 << attempt.min(6));
    let jitter = rand::rng().random_range(0..=250);
    Duration::from_millis(base + jitter)
}

fn is_retryable(error: &ApicaseError) -> bool {
    match error {
        ApicaseError::HttpError(e) => e.is_connect() || e.is_timeout(),
        ApicaseError::NetworkError(_) => true,
        _ => false,
    }
}
