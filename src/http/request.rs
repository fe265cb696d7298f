use serde_json::Value;

use crate::Result;
use crate::http::types::Method;

/// 请求体的三种发送模式，由 Content-Type 决定
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// application/json
    Json(Value),

    /// application/x-www-form-urlencoded
    Form(Vec<(String, String)>),

    /// text/plain 或其他原样发送的文本
    Text(String),
}

pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query_params: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl Request {
    pub fn new(method: &str, url: &str) -> Result<Self> {
        Ok(Self {
            method: method.parse()?,
            url: url.to_string(),
            headers: Vec::new(),
            query_params: Vec::new(),
            body: None,
        })
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query_params
            .push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_json(mut self, data: Value) -> Self {
        if self.content_type().is_none() {
            self.headers
                .push(("Content-Type".to_string(), "application/json".to_string()));
        }
        self.body = Some(RequestBody::Json(data));
        self
    }

    pub fn with_form(mut self, fields: Vec<(String, String)>) -> Self {
        if self.content_type().is_none() {
            self.headers.push((
                "Content-Type".to_string(),
                "application/x-www-form-urlencoded".to_string(),
            ));
        }
        self.body = Some(RequestBody::Form(fields));
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        if self.content_type().is_none() {
            self.headers
                .push(("Content-Type".to_string(), "text/plain".to_string()));
        }
        self.body = Some(RequestBody::Text(text.to_string()));
        self
    }

    /// Content-Type 值，键大小写不敏感
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .map(|(_, v)| v.as_str())
    }

    /// 带查询参数的完整 URL
    pub fn full_url(&self) -> String {
        if self.query_params.is_empty() {
            return self.url.clone();
        }

        let query: String = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query_params.iter().map(|(k, v)| (k, v)))
            .finish();
        let sep = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{}{}", self.url, sep, query)
    }

    /// 生成等效的 curl 命令，用于日志
    pub fn to_curl(&self) -> String {
        let mut parts = vec!["curl".to_string(), "-X".to_string(), self.method.to_string()];

        match &self.body {
            Some(RequestBody::Json(value)) => {
                let json = serde_json::to_string(value).unwrap_or_default();
                parts.push("--data-raw".to_string());
                parts.push(shell_quote(&json));
            }
            Some(RequestBody::Form(fields)) => {
                let form: Vec<String> =
                    fields.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                parts.push("--data".to_string());
                parts.push(shell_quote(&form.join("&")));
            }
            Some(RequestBody::Text(text)) => {
                parts.push("--data".to_string());
                parts.push(shell_quote(text));
            }
            None => {}
        }

        for (key, value) in &self.headers {
            parts.push("-H".to_string());
            parts.push(shell_quote(&format!("{}: {}", key, value)));
        }

        parts.push(shell_quote(&self.full_url()));
        parts.join(" ")
    }
}

/// 单引号包裹，内部单引号按 POSIX 方式转义
fn shell_quote(s: &str) -> String {
    if !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:%".contains(c))
    {
        return s.to_string();
    }
    format!("'{}'", s.replace('\'', r"'\''"))
}
