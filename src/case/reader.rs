use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::case::types::TestCase;
use crate::{ApicaseError, Result};

/// 用例文件读取器，支持 CSV 和 JSON
pub struct CaseReader;

impl CaseReader {
    /// 读取一个用例文件，按扩展名分发
    ///
    /// 禁用的行也会返回（enabled = false），由执行器跳过并计入报告。
    pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Vec<TestCase>> {
        let path = path.as_ref();
        info!("读取用例文件: {}", path.display());

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        let records = match ext.as_str() {
            "csv" => Self::read_csv(path)?,
            "json" => Self::read_json(path)?,
            other => {
                return Err(ApicaseError::CaseFileError(format!(
                    "不支持的文件格式: {} ({})",
                    path.display(),
                    other
                )));
            }
        };

        let mut cases = Vec::new();
        for (index, record) in records.iter().enumerate() {
            let case = TestCase::from_record(record);
            debug!(
                "第 {} 行加载用例: {} (enabled: {})",
                index + 1,
                case.display_name(),
                case.enabled
            );
            cases.push(case);
        }

        info!("从 {} 读取 {} 条用例", path.display(), cases.len());
        Ok(cases)
    }

    /// 扫描目录下的全部用例文件（.csv/.json），按文件名排序
    pub fn discover_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let mut files = Vec::new();

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_lowercase())
                .unwrap_or_default();
            if ext == "csv" || ext == "json" {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }

    fn read_csv(path: &Path) -> Result<Vec<HashMap<String, String>>> {
        let content = fs::read_to_string(path)?;
        let mut lines = content.lines().filter(|l| !l.trim().is_empty());

        let Some(header_line) = lines.next() else {
            warn!("用例文件为空: {}", path.display());
            return Ok(Vec::new());
        };
        let headers = parse_csv_line(header_line);

        let mut records = Vec::new();
        for line in lines {
            let fields = parse_csv_line(line);
            let mut record = HashMap::new();
            for (i, header) in headers.iter().enumerate() {
                let value = fields.get(i).cloned().unwrap_or_default();
                record.insert(header.clone(), value);
            }
            records.push(record);
        }
        Ok(records)
    }

    fn read_json(path: &Path) -> Result<Vec<HashMap<String, String>>> {
        let content = fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&content).map_err(|e| {
            ApicaseError::CaseFileError(format!("{} 不是有效 JSON: {}", path.display(), e))
        })?;

        // 单个对象视为一行
        let rows = match value {
            Value::Array(items) => items,
            obj @ Value::Object(_) => vec![obj],
            _ => {
                return Err(ApicaseError::CaseFileError(format!(
                    "{} 的顶层必须是对象或对象数组",
                    path.display()
                )));
            }
        };

        let mut records = Vec::new();
        for (index, row) in rows.into_iter().enumerate() {
            let Value::Object(map) = row else {
                warn!("第 {} 个元素不是对象，跳过", index + 1);
                continue;
            };
            let record = map
                .into_iter()
                .map(|(k, v)| (k, json_cell_to_string(v)))
                .collect();
            records.push(record);
        }
        Ok(records)
    }
}

/// 解析一行 CSV，处理引号包裹和 "" 转义
fn parse_csv_line(line: &str) -> Vec<String> {
    let line = line.strip_suffix('\r').unwrap_or(line);

    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    // 转义的双引号
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            c => current.push(c),
        }
    }

    fields.push(current.trim().to_string());
    fields
}

/// JSON 单元格转字符串：字符串原样，标量用显示形式，复合值用紧凑 JSON
fn json_cell_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => serde_json::to_string(&other).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_line_plain() {
        assert_eq!(parse_csv_line("a,b,c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_csv_line_quoted_comma() {
        assert_eq!(
            parse_csv_line(r#"TC001,"{""a"": 1, ""b"": 2}",200"#),
            vec!["TC001", r#"{"a": 1, "b": 2}"#, "200"]
        );
    }

    #[test]
    fn test_parse_csv_line_trailing_empty() {
        assert_eq!(parse_csv_line("a,,"), vec!["a", "", ""]);
    }

    #[test]
    fn test_parse_csv_line_crlf() {
        assert_eq!(parse_csv_line("a,b\r"), vec!["a", "b"]);
    }

    #[test]
    fn test_json_cell_to_string() {
        assert_eq!(json_cell_to_string(Value::from("x")), "x");
        assert_eq!(json_cell_to_string(Value::from(42)), "42");
        assert_eq!(json_cell_to_string(Value::from(true)), "true");
        assert_eq!(json_cell_to_string(Value::Null), "");
        assert_eq!(
            json_cell_to_string(serde_json::json!({"a": 1})),
            r#"{"a":1}"#
        );
    }
}
