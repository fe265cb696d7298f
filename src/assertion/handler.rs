use serde_json::Value;
use tracing::debug;

use crate::assertion::types::{AssertError, AssertionResult};
use crate::data::extract::lookup_path;
use crate::http::Response;
use crate::utils::json::{coerce_str, is_json, normalize_json};

/// 响应断言处理器
///
/// 所有断言返回 `AssertionResult` 记录而不是直接失败，
/// 由执行器汇总后决定用例结果。
pub struct AssertHandler;

impl AssertHandler {
    /// 断言响应状态码
    ///
    /// expected 为数字字符串时按相等比较；
    /// 其余情况退化为状态码文本的包含比较（兼容 "2xx 任意" 之类的写法）。
    pub fn assert_status(response: &Response, expected: &str) -> AssertionResult {
        let raw = format!("status == {}", expected);
        let actual = response.status.code();
        debug!("状态码断言: 期望 {} 实际 {}", expected, actual);

        let passed = match expected.trim().parse::<u16>() {
            Ok(code) => actual == code,
            Err(_) => actual.to_string().contains(expected.trim()),
        };

        if passed {
            AssertionResult::success(raw, actual.to_string(), expected.to_string())
        } else {
            let message = format!("期望状态码: {}, 实际状态码: {}", expected, actual);
            AssertionResult::failure(raw, actual.to_string(), expected.to_string(), message)
        }
    }

    /// 断言响应内容包含指定文本
    ///
    /// 期望和实际都是合法 JSON 时先标准化再比较，
    /// 避免表格里的空格/换行影响匹配。
    pub fn assert_content_contains(response: &Response, expected: &str) -> AssertionResult {
        let raw = format!("body contains {}", expected);
        let actual = response.text();

        let passed = if is_json(expected) && is_json(actual) {
            debug!("检测到 JSON 格式内容，标准化后比较");
            normalize_json(actual).contains(&normalize_json(expected))
        } else {
            actual.contains(expected)
        };

        let shown = truncate(actual, 200);
        if passed {
            AssertionResult::success(raw, shown, expected.to_string())
        } else {
            let message = format!("期望内容 '{}' 未找到", expected);
            AssertionResult::failure(raw, shown, expected.to_string(), message)
        }
    }

    /// 断言 JSON 响应中指定路径的值
    ///
    /// 路径语法与提取规则一致（点号 + `[下标]`）。期望值按内容转换类型：
    /// 数字按数值比较，true/false/null 按字面量，其余按字符串。
    pub fn assert_json_value(response: &Response, path: &str, expected: &str) -> AssertionResult {
        let raw = format!("body.{} == {}", path, expected);

        let Some(json) = response.json() else {
            return AssertionResult::error(
                raw,
                AssertError::NotJson(truncate(response.text(), 100)),
            );
        };

        let Some(actual) = lookup_path(&json, path) else {
            return AssertionResult::error(raw, AssertError::PathNotFound(path.to_string()));
        };

        let expected_value = coerce_str(expected);
        let passed = json_values_equal(actual, &expected_value);

        let actual_str = render(actual);
        if passed {
            AssertionResult::success(raw, actual_str, expected.to_string())
        } else {
            let message = format!(
                "路径 {} 期望值: {}, 实际值: {}",
                path, expected, actual_str
            );
            AssertionResult::failure(raw, actual_str, expected.to_string(), message)
        }
    }

    /// 断言响应内容匹配正则表达式
    pub fn assert_regex(response: &Response, pattern: &str) -> AssertionResult {
        let raw = format!("body matches {}", pattern);

        let re = match regex::Regex::new(pattern) {
            Ok(re) => re,
            Err(e) => {
                return AssertionResult::error(raw, AssertError::InvalidPattern(e.to_string()));
            }
        };

        let actual = response.text();
        if re.is_match(actual) {
            AssertionResult::success(raw, truncate(actual, 200), pattern.to_string())
        } else {
            let message = format!("正则表达式 '{}' 未匹配", pattern);
            AssertionResult::failure(raw, truncate(actual, 200), pattern.to_string(), message)
        }
    }

    /// 断言 JSON 结构符合预期
    ///
    /// 对象按键递归检查，数组比较首元素，标量只比较类型。
    pub fn assert_json_structure(response: &Response, expected_structure: &str) -> AssertionResult {
        let raw = format!("body structure == {}", expected_structure);

        let expected: Value = match serde_json::from_str(expected_structure) {
            Ok(v) => v,
            Err(e) => {
                return AssertionResult::error(raw, AssertError::InvalidValue(e.to_string()));
            }
        };

        let Some(actual) = response.json() else {
            return AssertionResult::error(
                raw,
                AssertError::NotJson(truncate(response.text(), 100)),
            );
        };

        if check_structure(&actual, &expected) {
            AssertionResult::success(raw, truncate(response.text(), 200), expected_structure.to_string())
        } else {
            let message = format!("实际结构与期望结构不符: {}", expected_structure);
            AssertionResult::failure(
                raw,
                truncate(response.text(), 200),
                expected_structure.to_string(),
                message,
            )
        }
    }

    /// 断言响应时间不超过 max_ms 毫秒
    pub fn assert_response_time(response: &Response, max_ms: u64) -> AssertionResult {
        let raw = format!("response.time <= {}ms", max_ms);
        let actual = response.duration.as_millis() as u64;

        if actual <= max_ms {
            AssertionResult::success(raw, format!("{}ms", actual), format!("<= {}ms", max_ms))
        } else {
            let message = format!("实际响应时间: {}ms, 最大允许: {}ms", actual, max_ms);
            AssertionResult::failure(
                raw,
                format!("{}ms", actual),
                format!("<= {}ms", max_ms),
                message,
            )
        }
    }
}

/// 值比较：数字按数值，其余按 JSON 相等，最后退化为字符串形式比较
fn json_values_equal(actual: &Value, expected: &Value) -> bool {
    if let (Some(a), Some(b)) = (actual.as_f64(), expected.as_f64()) {
        return (a - b).abs() < f64::EPSILON;
    }
    if actual == expected {
        return true;
    }
    // 表格里一切都是字符串，"true" 对布尔 true 也应当通过
    render(actual) == render(expected)
}

/// 递归结构检查
fn check_structure(actual: &Value, expected: &Value) -> bool {
    match expected {
        Value::Object(expected_map) => {
            let Some(actual_map) = actual.as_object() else {
                return false;
            };
            expected_map.iter().all(|(key, expected_child)| {
                actual_map
                    .get(key)
                    .is_some_and(|actual_child| check_structure(actual_child, expected_child))
            })
        }
        Value::Array(expected_items) => {
            let Some(actual_items) = actual.as_array() else {
                return false;
            };
            match (actual_items.first(), expected_items.first()) {
                (Some(a), Some(e)) => check_structure(a, e),
                _ => true,
            }
        }
        Value::Number(_) => actual.is_number(),
        Value::String(_) => actual.is_string(),
        Value::Bool(_) => actual.is_boolean(),
        Value::Null => actual.is_null(),
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderMap;
    use std::time::Duration;

    fn create_test_response(status: u16, body: &str, duration_ms: u64) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", "application/json".parse().unwrap());

        Response {
            status: crate::http::Status::new(status).unwrap(),
            headers,
            body: body.to_string(),
            duration: Duration::from_millis(duration_ms),
        }
    }

    #[test]
    fn test_assert_status_pass() {
        let response = create_test_response(200, "{}", 10);
        assert!(AssertHandler::assert_status(&response, "200").passed);
    }

    #[test]
    fn test_assert_status_fail() {
        let response = create_test_response(404, "{}", 10);
        let result = AssertHandler::assert_status(&response, "200");
        assert!(!result.passed);
        assert_eq!(result.actual.as_deref(), Some("404"));
        assert!(result.message.is_some());
    }

    #[test]
    fn test_assert_status_substring_fallback() {
        let response = create_test_response(201, "{}", 10);
        // 非数字期望退化为包含比较
        assert!(AssertHandler::assert_status(&response, "20").passed);
    }

    #[test]
    fn test_assert_content_contains_plain() {
        let response = create_test_response(200, "hello world", 10);
        assert!(AssertHandler::assert_content_contains(&response, "world").passed);
        assert!(!AssertHandler::assert_content_contains(&response, "absent").passed);
    }

    #[test]
    fn test_assert_content_contains_json_normalized() {
        let response = create_test_response(200, r#"{"code": 0, "msg": "ok"}"#, 10);
        // 期望内容带多余空格和换行，标准化后仍能匹配
        let expected = "{\n  \"code\": 0,\n  \"msg\": \"ok\"\n}";
        assert!(AssertHandler::assert_content_contains(&response, expected).passed);
    }

    #[test]
    fn test_assert_json_value_string() {
        let response = create_test_response(200, r#"{"user": {"name": "alice"}}"#, 10);
        assert!(AssertHandler::assert_json_value(&response, "user.name", "alice").passed);
    }

    #[test]
    fn test_assert_json_value_number_coercion() {
        let response = create_test_response(200, r#"{"code": 0}"#, 10);
        assert!(AssertHandler::assert_json_value(&response, "code", "0").passed);
        assert!(!AssertHandler::assert_json_value(&response, "code", "1").passed);
    }

    #[test]
    fn test_assert_json_value_bool_as_string() {
        let response = create_test_response(200, r#"{"active": true}"#, 10);
        assert!(AssertHandler::assert_json_value(&response, "active", "true").passed);
    }

    #[test]
    fn test_assert_json_value_array_index() {
        let response =
            create_test_response(200, r#"{"items": [{"id": "a"}, {"id": "b"}]}"#, 10);
        assert!(AssertHandler::assert_json_value(&response, "items[1].id", "b").passed);
    }

    #[test]
    fn test_assert_json_value_path_missing() {
        let response = create_test_response(200, r#"{"a": 1}"#, 10);
        let result = AssertHandler::assert_json_value(&response, "missing.path", "x");
        assert!(!result.passed);
        assert!(result.message.unwrap().contains("not found"));
    }

    #[test]
    fn test_assert_json_value_on_non_json() {
        let response = create_test_response(200, "plain", 10);
        let result = AssertHandler::assert_json_value(&response, "a", "1");
        assert!(!result.passed);
    }

    #[test]
    fn test_assert_regex() {
        let response = create_test_response(200, r#"{"order": "A-2024"}"#, 10);
        assert!(AssertHandler::assert_regex(&response, r"A-\d{4}").passed);
        assert!(!AssertHandler::assert_regex(&response, r"B-\d{4}").passed);
    }

    #[test]
    fn test_assert_regex_invalid_pattern() {
        let response = create_test_response(200, "x", 10);
        let result = AssertHandler::assert_regex(&response, "([unclosed");
        assert!(!result.passed);
        assert!(result.actual.is_none());
    }

    #[test]
    fn test_assert_json_structure() {
        let response = create_test_response(
            200,
            r#"{"user": {"id": 1, "name": "alice"}, "tags": ["a", "b"]}"#,
            10,
        );
        let expected = r#"{"user": {"id": 0, "name": ""}, "tags": [""]}"#;
        assert!(AssertHandler::assert_json_structure(&response, expected).passed);

        // 类型不匹配
        let expected = r#"{"user": {"id": ""}}"#;
        assert!(!AssertHandler::assert_json_structure(&response, expected).passed);

        // 缺少键
        let expected = r#"{"missing": 0}"#;
        assert!(!AssertHandler::assert_json_structure(&response, expected).passed);
    }

    #[test]
    fn test_assert_response_time() {
        let response = create_test_response(200, "{}", 150);
        assert!(AssertHandler::assert_response_time(&response, 200).passed);
        assert!(!AssertHandler::assert_response_time(&response, 100).passed);
    }
}
