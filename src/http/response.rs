use std::time::Duration;

use reqwest::header::HeaderMap as Headers;
use serde_json::Value;

use crate::Result;
use crate::http::types::Status;

#[derive(Debug, Clone)]
pub struct Response {
    pub status: Status,
    pub headers: Headers,
    pub body: String,
    pub duration: Duration,
}

impl Response {
    pub fn new(status: u16, headers: Headers, body: String, duration: Duration) -> Result<Self> {
        Ok(Self {
            status: Status::new(status)?,
            headers,
            body,
            duration,
        })
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn is_client_error(&self) -> bool {
        self.status.is_client_error()
    }

    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }

    pub fn text(&self) -> &str {
        &self.body
    }

    /// 响应体的 JSON 解析结果，非 JSON 返回 None
    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_parse() {
        let resp = Response::new(
            200,
            Headers::new(),
            r#"{"id": 1}"#.to_string(),
            Duration::from_millis(10),
        )
        .unwrap();
        assert_eq!(resp.json().unwrap()["id"], 1);
    }

    #[test]
    fn test_json_on_plain_text() {
        let resp = Response::new(
            200,
            Headers::new(),
            "hello".to_string(),
            Duration::from_millis(10),
        )
        .unwrap();
        assert!(resp.json().is_none());
    }
}
