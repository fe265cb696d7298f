use anyhow::Result;
use colored::*;

use crate::http::Response;

pub enum ResponseFormat {
    Compact,
    Verbose,
}

/// 响应输出格式化器
pub struct ResponseFormatter {
    format: ResponseFormat,
    color: bool,
}

impl ResponseFormatter {
    pub fn new(format: ResponseFormat) -> Self {
        Self {
            format,
            color: true,
        }
    }

    pub fn format(&self, response: &Response) -> Result<String> {
        match self.format {
            ResponseFormat::Compact => self.format_compact(response),
            ResponseFormat::Verbose => self.format_verbose(response),
        }
    }

    fn status_line(&self, response: &Response, bold: bool) -> String {
        let line = format!(
            "HTTP {} {}",
            response.status.code(),
            response.status.reason_phrase()
        );
        if !self.color {
            return line;
        }
        let colored_line = if response.is_success() {
            line.green()
        } else if response.is_client_error() {
            line.yellow()
        } else {
            line.red()
        };
        if bold {
            colored_line.bold().to_string()
        } else {
            colored_line.to_string()
        }
    }

    fn timing_line(&self, response: &Response) -> String {
        let line = format!("Time: {}ms", response.duration.as_millis());
        if self.color {
            line.cyan().to_string()
        } else {
            line
        }
    }

    fn format_compact(&self, response: &Response) -> Result<String> {
        let mut output = vec![self.status_line(response, false), self.timing_line(response)];

        let body = &response.body;
        if !body.is_empty() && body.len() < 200 {
            // 尝试格式化 JSON，失败则显示原始内容
            let formatted = self
                .try_format_json(body)
                .unwrap_or_else(|_| body.to_string());
            output.push(formatted);
        } else if !body.is_empty() {
            output.push(format!("Body: {} bytes", body.len()));
        }

        Ok(output.join("\n"))
    }

    fn format_verbose(&self, response: &Response) -> Result<String> {
        let mut output = vec![self.status_line(response, true), self.timing_line(response)];

        output.push(String::new());
        output.push(if self.color {
            "Headers:".blue().bold().to_string()
        } else {
            "Headers:".to_string()
        });
        for (key, value) in response.headers.iter() {
            let value_str = value.to_str().unwrap_or("<invalid utf-8>");
            let line = format!("   {}: {}", key, value_str);
            if self.color {
                output.push(line.blue().to_string());
            } else {
                output.push(line);
            }
        }

        let body = &response.body;
        if !body.is_empty() {
            output.push(String::new());
            output.push(if self.color {
                "Body:".blue().bold().to_string()
            } else {
                "Body:".to_string()
            });
            let formatted = self
                .try_format_json(body)
                .unwrap_or_else(|_| body.to_string());
            output.push(formatted);
        }

        Ok(output.join("\n"))
    }

    /// 尝试将 body 格式化为漂亮的 JSON
    /// 如果不是有效的 JSON，返回错误
    fn try_format_json(&self, body: &str) -> Result<String> {
        let value: serde_json::Value = serde_json::from_str(body)?;
        serde_json::to_string_pretty(&value).map_err(Into::into)
    }
}
