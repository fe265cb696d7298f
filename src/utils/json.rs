use serde_json::Value;

/// 安全解析 JSON 字符串，失败返回 None
pub fn parse_json_safely(text: &str) -> Option<Value> {
    serde_json::from_str(text).ok()
}

/// 判断字符串是否为有效 JSON
pub fn is_json(text: &str) -> bool {
    serde_json::from_str::<Value>(text).is_ok()
}

/// 标准化 JSON 字符串：解析后重新序列化为紧凑格式
///
/// 表格里录入的期望内容经常带多余空格/换行，标准化后再做包含比较。
/// 解析失败时退化为压缩空白的原始字符串。
pub fn normalize_json(text: &str) -> String {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => serde_json::to_string(&value).unwrap_or_else(|_| text.to_string()),
        Err(_) => text.split_whitespace().collect::<Vec<_>>().join(" "),
    }
}

/// 将字符串按内容转换为 JSON 值：null/bool/数字/内嵌 JSON，否则保持字符串
pub fn coerce_str(value: &str) -> Value {
    let trimmed = value.trim();

    if trimmed.eq_ignore_ascii_case("none") || trimmed.eq_ignore_ascii_case("null") {
        return Value::Null;
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Value::from(n);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        return Value::from(f);
    }
    if (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']'))
    {
        if let Ok(v) = serde_json::from_str(trimmed) {
            return v;
        }
    }

    Value::String(value.to_string())
}
