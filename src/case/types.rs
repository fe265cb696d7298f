use std::collections::HashMap;

/// 一行测试用例，执行期间只读
///
/// 所有字段按表格原文保存为字符串，变量替换和 JSON 解析在执行时进行。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestCase {
    pub case_id: String,
    pub case_name: String,
    pub method: String,
    pub url: String,

    /// 请求头，JSON 对象字符串
    pub headers: String,

    /// URL 参数，JSON 对象字符串
    pub params: String,

    /// 请求体，JSON 字符串或纯文本
    pub body: String,

    pub expected_status: String,
    pub expected_content: String,
    pub json_path: String,
    pub expected_json_value: String,

    /// 提取规则（extract_key 列的 mini-DSL）
    pub extract_key: String,

    /// 单值提取时的目标变量名
    pub save_var_name: String,

    /// 兼容列，读入但执行器不使用
    pub validate: String,

    /// enabled 列的判定结果，禁用的用例由执行器跳过
    pub enabled: bool,
}

impl TestCase {
    /// 从列名→值的记录构造用例，应用列别名
    ///
    /// 别名: id→case_id, name→case_name, data→body,
    /// expected_result→expected_content, extract/variable→extract_key
    pub fn from_record(record: &HashMap<String, String>) -> Self {
        let field = |names: &[&str]| -> String {
            for name in names {
                if let Some(v) = record.get(*name) {
                    if !v.is_empty() {
                        return v.clone();
                    }
                }
            }
            String::new()
        };

        Self {
            case_id: field(&["case_id", "id"]),
            case_name: field(&["case_name", "name"]),
            method: field(&["method"]).to_uppercase(),
            url: field(&["url"]),
            headers: field(&["headers"]),
            params: field(&["params"]),
            body: field(&["body", "data"]),
            expected_status: field(&["expected_status"]),
            expected_content: field(&["expected_content", "expected_result"]),
            json_path: field(&["json_path"]),
            expected_json_value: field(&["expected_json_value"]),
            extract_key: field(&["extract_key", "extract", "variable"]),
            save_var_name: field(&["save_var_name"]),
            validate: field(&["validate"]),
            enabled: is_enabled(&field(&["enabled"])),
        }
    }

    /// 用例显示名: "case_id - case_name"
    pub fn display_name(&self) -> String {
        match (self.case_id.is_empty(), self.case_name.is_empty()) {
            (false, false) => format!("{} - {}", self.case_id, self.case_name),
            (false, true) => self.case_id.clone(),
            (true, false) => self.case_name.clone(),
            (true, true) => "<unnamed>".to_string(),
        }
    }
}

/// enabled 列的真值判断
///
/// `1/true/yes/enabled/enable/y/t`（大小写不敏感）为启用；
/// 空值默认为启用，其余值为禁用。
pub fn is_enabled(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    if v.is_empty() {
        return true;
    }
    matches!(
        v.as_str(),
        "1" | "true" | "yes" | "enabled" | "enable" | "y" | "t"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_from_record_basic() {
        let case = TestCase::from_record(&record(&[
            ("case_id", "TC001"),
            ("case_name", "登录"),
            ("method", "post"),
            ("url", "/api/login"),
            ("headers", r#"{"Content-Type": "application/json"}"#),
            ("body", r#"{"user": "foo"}"#),
            ("expected_status", "200"),
        ]));

        assert_eq!(case.case_id, "TC001");
        assert_eq!(case.method, "POST");
        assert_eq!(case.url, "/api/login");
        assert_eq!(case.expected_status, "200");
        assert!(case.params.is_empty());
    }

    #[test]
    fn test_from_record_aliases() {
        let case = TestCase::from_record(&record(&[
            ("id", "TC002"),
            ("name", "查询"),
            ("data", r#"{"q": "x"}"#),
            ("expected_result", "ok"),
            ("extract", "token=json.token"),
        ]));

        assert_eq!(case.case_id, "TC002");
        assert_eq!(case.case_name, "查询");
        assert_eq!(case.body, r#"{"q": "x"}"#);
        assert_eq!(case.expected_content, "ok");
        assert_eq!(case.extract_key, "token=json.token");
    }

    #[test]
    fn test_canonical_column_wins_over_alias() {
        let case = TestCase::from_record(&record(&[
            ("case_id", "TC003"),
            ("id", "ignored"),
        ]));
        assert_eq!(case.case_id, "TC003");
    }

    #[test]
    fn test_from_record_enabled_flag() {
        let case = TestCase::from_record(&record(&[("case_id", "TC004")]));
        assert!(case.enabled);

        let case = TestCase::from_record(&record(&[("case_id", "TC005"), ("enabled", "0")]));
        assert!(!case.enabled);
    }

    #[test]
    fn test_is_enabled() {
        for v in ["1", "true", "YES", "Enabled", "enable", "y", "T", "", "  "] {
            assert!(is_enabled(v), "expected enabled: {:?}", v);
        }
        for v in ["0", "false", "no", "disabled", "off"] {
            assert!(!is_enabled(v), "expected disabled: {:?}", v);
        }
    }

    #[test]
    fn test_display_name() {
        let mut case = TestCase::default();
        assert_eq!(case.display_name(), "<unnamed>");
        case.case_id = "TC001".to_string();
        assert_eq!(case.display_name(), "TC001");
        case.case_name = "登录".to_string();
        assert_eq!(case.display_name(), "TC001 - 登录");
    }
}
