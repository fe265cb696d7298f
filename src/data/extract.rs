use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

/// JSON 路径分段: 普通键名 或 `[数字]` 数组下标
static PATH_SEGMENT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^.\[\]]+|\[\d+\]").unwrap());

/// 提取来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractSource {
    /// 正则表达式提取，`regex:` 前缀（大小写不敏感）
    /// 示例: regex:"token":"([^"]+)"
    Regex(String),

    /// 点号/下标 JSON 路径提取
    /// 示例: debug[0].path1, user.id
    JsonPath(String),
}

impl ExtractSource {
    /// 解析单条提取来源
    ///
    /// `json.` 前缀会被剥掉（兼容 `token=json.token` 写法）。
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if Self::is_regex(raw) {
            return ExtractSource::Regex(raw[6..].to_string());
        }

        let path = raw.strip_prefix("json.").unwrap_or(raw);
        ExtractSource::JsonPath(path.to_string())
    }

    /// `regex:` 前缀检查，大小写不敏感
    fn is_regex(raw: &str) -> bool {
        raw.get(..6)
            .is_some_and(|p| p.eq_ignore_ascii_case("regex:"))
    }
}

/// 单条提取规则，可带别名: `name=path`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractRule {
    /// 变量别名（`name=path` 的 name 部分）
    pub alias: Option<String>,

    /// 提取来源
    pub source: ExtractSource,
}

impl ExtractRule {
    fn parse(raw: &str) -> Self {
        // 不带别名的纯正则规则里允许出现 '='，如 regex:code=(\d+)
        if ExtractSource::is_regex(raw.trim()) {
            return Self {
                alias: None,
                source: ExtractSource::parse(raw),
            };
        }

        // 别名只在第一个 '=' 处分割，regex 模式里可以再出现 '='
        match raw.split_once('=') {
            Some((alias, rest)) => Self {
                alias: Some(alias.trim().to_string()),
                source: ExtractSource::parse(rest),
            },
            None => Self {
                alias: None,
                source: ExtractSource::parse(raw),
            },
        }
    }

    /// 规则的变量名：别名优先，否则用规则原文
    fn var_name(&self) -> String {
        if let Some(alias) = &self.alias {
            return alias.clone();
        }
        match &self.source {
            ExtractSource::Regex(pattern) => format!("regex:{}", pattern),
            ExtractSource::JsonPath(path) => path.clone(),
        }
    }
}

/// 提取结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    /// 单规则的提取值
    Single(String),

    /// 多规则（或带别名）的提取值，按规则顺序排列
    Many(Vec<(String, String)>),
}

/// 完整的提取规格：`;` 分隔的一条或多条规则
///
/// 语法（与用例表格的 extract_key 列对应）:
/// - `token`               — 单条 JSON 路径
/// - `debug[0].path1`      — 带数组下标的路径
/// - `regex:id="([^"]+)"`  — 正则提取
/// - `token=json.token`    — 别名赋值
/// - `a=user.id; b=regex:code=(\d+)` — 多条规则
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractSpec {
    rules: Vec<ExtractRule>,
    /// 原文含 `;` 或 `=` 时按多值模式返回
    many: bool,
}

impl ExtractSpec {
    /// 解析提取规格，空白输入返回 None
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let many = raw.contains(';') || raw.contains('=');
        let rules: Vec<ExtractRule> = raw
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ExtractRule::parse)
            .collect();

        if rules.is_empty() {
            return None;
        }

        Some(Self { rules, many })
    }

    /// 规则条数
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 对响应执行提取
    ///
    /// `body_json` 为响应体的 JSON 解析结果（可能失败），`body_text` 为原始文本。
    /// 提取失败的规则得到空值：多值模式下跳过该项，单值模式返回空字符串。
    pub fn apply(&self, body_json: Option<&Value>, body_text: &str) -> Extracted {
        if !self.many {
            let value = apply_source(&self.rules[0].source, body_json, body_text);
            debug!("单值提取: {:?} -> {}", self.rules[0].source, value);
            return Extracted::Single(value);
        }

        let mut pairs = Vec::new();
        for rule in &self.rules {
            let name = rule.var_name();
            let value = apply_source(&rule.source, body_json, body_text);
            if value.is_empty() {
                warn!("未能提取到变量 {} (规则: {:?})", name, rule.source);
                continue;
            }
            debug!("提取变量 {} = {}", name, value);
            pairs.push((name, value));
        }
        Extracted::Many(pairs)
    }
}

/// 执行单条提取来源，失败返回空字符串
fn apply_source(source: &ExtractSource, body_json: Option<&Value>, body_text: &str) -> String {
    match source {
        ExtractSource::Regex(pattern) => apply_regex(pattern, body_json, body_text),
        ExtractSource::JsonPath(path) => {
            let Some(json) = body_json else {
                warn!("响应体不是有效 JSON，路径 {} 提取失败", path);
                return String::new();
            };
            match lookup_path(json, path) {
                Some(value) => render_value(value),
                None => {
                    warn!("JSON 路径 {} 未找到", path);
                    String::new()
                }
            }
        }
    }
}

/// 正则提取：有捕获组取第 1 组，否则取整体匹配
///
/// 响应若是带 `html` 字符串字段的 JSON 对象，优先对该字段匹配，
/// 避免转义后的 `\n`/`\"` 影响模式；否则匹配原始响应文本。
fn apply_regex(pattern: &str, body_json: Option<&Value>, body_text: &str) -> String {
    let re = match regex::RegexBuilder::new(pattern).dot_matches_new_line(true).build() {
        Ok(re) => re,
        Err(e) => {
            warn!("正则表达式 {} 编译失败: {}", pattern, e);
            return String::new();
        }
    };

    let target: &str = body_json
        .and_then(|json| json.get("html"))
        .and_then(Value::as_str)
        .unwrap_or(body_text);

    match re.captures(target) {
        Some(caps) => {
            let m = caps.get(1).or_else(|| caps.get(0));
            m.map(|m| m.as_str().to_string()).unwrap_or_default()
        }
        None => {
            warn!("正则表达式 {} 未匹配到内容", pattern);
            String::new()
        }
    }
}

/// 按点号/下标路径在 JSON 值里查找
///
/// `debug[0].path1` 被拆成 `debug`、`[0]`、`path1` 三段逐层下钻。
/// 断言模块复用同一个查找器，保证提取与断言语义一致。
pub fn lookup_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in PATH_SEGMENT_REGEX.find_iter(path) {
        let segment = segment.as_str();
        if let Some(index) = segment.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            let index: usize = index.parse().ok()?;
            current = current.as_array()?.get(index)?;
        } else {
            current = current.as_object()?.get(segment)?;
        }
    }
    Some(current)
}

/// 将 JSON 值渲染为变量字符串：标量不带引号，复合值用紧凑 JSON
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_single_path() {
        let spec = ExtractSpec::parse("token").unwrap();
        assert_eq!(spec.len(), 1);
        assert!(!spec.many);
    }

    #[test]
    fn test_parse_alias() {
        let spec = ExtractSpec::parse("token=json.token").unwrap();
        assert!(spec.many);
        assert_eq!(spec.rules[0].alias.as_deref(), Some("token"));
        assert_eq!(
            spec.rules[0].source,
            ExtractSource::JsonPath("token".to_string())
        );
    }

    #[test]
    fn test_parse_multi_rule() {
        let spec = ExtractSpec::parse("message=debug[0].path1; code=status.code").unwrap();
        assert_eq!(spec.len(), 2);
        assert_eq!(spec.rules[1].alias.as_deref(), Some("code"));
    }

    #[test]
    fn test_parse_regex_keeps_equals_in_pattern() {
        let spec = ExtractSpec::parse(r#"list_id=regex:id="([^"]+)""#).unwrap();
        assert_eq!(spec.rules[0].alias.as_deref(), Some("list_id"));
        assert_eq!(
            spec.rules[0].source,
            ExtractSource::Regex(r#"id="([^"]+)""#.to_string())
        );
    }

    #[test]
    fn test_parse_regex_case_insensitive_prefix() {
        assert_eq!(
            ExtractSource::parse("REGEX:(\\d+)"),
            ExtractSource::Regex("(\\d+)".to_string())
        );
    }

    #[test]
    fn test_parse_blank_returns_none() {
        assert!(ExtractSpec::parse("").is_none());
        assert!(ExtractSpec::parse("   ").is_none());
        assert!(ExtractSpec::parse(" ; ; ").is_none());
    }

    #[test]
    fn test_lookup_nested_path() {
        let data = json!({"user": {"profile": {"email": "a@b.c"}}});
        let value = lookup_path(&data, "user.profile.email").unwrap();
        assert_eq!(value, &json!("a@b.c"));
    }

    #[test]
    fn test_lookup_array_index() {
        let data = json!({"debug": [{"path1": "first"}, {"path1": "second"}]});
        assert_eq!(
            lookup_path(&data, "debug[0].path1").unwrap(),
            &json!("first")
        );
        assert_eq!(
            lookup_path(&data, "debug[1].path1").unwrap(),
            &json!("second")
        );
    }

    #[test]
    fn test_lookup_out_of_range() {
        let data = json!({"items": [1, 2]});
        assert!(lookup_path(&data, "items[5]").is_none());
        assert!(lookup_path(&data, "items.missing").is_none());
        assert!(lookup_path(&data, "missing[0]").is_none());
    }

    #[test]
    fn test_apply_single_path() {
        let spec = ExtractSpec::parse("token").unwrap();
        let body = json!({"token": "abc123"});
        let result = spec.apply(Some(&body), r#"{"token":"abc123"}"#);
        assert_eq!(result, Extracted::Single("abc123".to_string()));
    }

    #[test]
    fn test_apply_single_path_number_unquoted() {
        let spec = ExtractSpec::parse("user.id").unwrap();
        let body = json!({"user": {"id": 42}});
        let result = spec.apply(Some(&body), "");
        assert_eq!(result, Extracted::Single("42".to_string()));
    }

    #[test]
    fn test_apply_alias_rule() {
        let spec = ExtractSpec::parse("token=json.token").unwrap();
        let body = json!({"token": "abc123"});
        let result = spec.apply(Some(&body), "");
        assert_eq!(
            result,
            Extracted::Many(vec![("token".to_string(), "abc123".to_string())])
        );
    }

    #[test]
    fn test_apply_multi_rule_order_kept() {
        let spec = ExtractSpec::parse("first=a; second=b").unwrap();
        let body = json!({"a": "1", "b": "2"});
        let result = spec.apply(Some(&body), "");
        assert_eq!(
            result,
            Extracted::Many(vec![
                ("first".to_string(), "1".to_string()),
                ("second".to_string(), "2".to_string()),
            ])
        );
    }

    #[test]
    fn test_apply_multi_rule_skips_missing() {
        let spec = ExtractSpec::parse("ok=a; gone=missing.path").unwrap();
        let body = json!({"a": "1"});
        let result = spec.apply(Some(&body), "");
        assert_eq!(
            result,
            Extracted::Many(vec![("ok".to_string(), "1".to_string())])
        );
    }

    #[test]
    fn test_apply_regex_group() {
        let spec = ExtractSpec::parse(r#"regex:"id":\s*"([^"]+)""#).unwrap();
        let text = r#"{"id": "abc-42", "name": "x"}"#;
        let result = spec.apply(None, text);
        assert_eq!(result, Extracted::Single("abc-42".to_string()));
    }

    #[test]
    fn test_apply_regex_whole_match_without_group() {
        let spec = ExtractSpec::parse(r"regex:\d{4}").unwrap();
        let result = spec.apply(None, "order 2024 confirmed");
        assert_eq!(result, Extracted::Single("2024".to_string()));
    }

    #[test]
    fn test_apply_regex_prefers_html_field() {
        let spec =
            ExtractSpec::parse(r#"list_id=regex:<div class="playlist-item" id="([^"]+)""#)
                .unwrap();
        let body = json!({
            "status": "ok",
            "html": r#"<div class="playlist-item" id="li-889900">我的列表</div>"#
        });
        // body_text 是转义后的 JSON 文本，直接匹配会失败
        let text = serde_json::to_string(&body).unwrap();
        let result = spec.apply(Some(&body), &text);
        assert_eq!(
            result,
            Extracted::Many(vec![("list_id".to_string(), "li-889900".to_string())])
        );
    }

    #[test]
    fn test_apply_invalid_regex_yields_empty() {
        let spec = ExtractSpec::parse("regex:([unclosed").unwrap();
        let result = spec.apply(None, "anything");
        assert_eq!(result, Extracted::Single(String::new()));
    }

    #[test]
    fn test_apply_path_on_non_json_body() {
        let spec = ExtractSpec::parse("token").unwrap();
        let result = spec.apply(None, "plain text body");
        assert_eq!(result, Extracted::Single(String::new()));
    }

    #[test]
    fn test_render_compound_value_as_compact_json() {
        let spec = ExtractSpec::parse("user").unwrap();
        let body = json!({"user": {"id": 1}});
        let result = spec.apply(Some(&body), "");
        assert_eq!(result, Extracted::Single(r#"{"id":1}"#.to_string()));
    }
}
