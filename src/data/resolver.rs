use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::{debug, warn};

use crate::data::store::VariableStore;

/// `${name}` 格式的占位符
static DOLLAR_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

/// `{{name}}` 格式的占位符
static BRACE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{([^{}]+)\}\}").unwrap());

/// 变量替换器
///
/// 支持 `${name}` 和 `{{name}}` 两种占位符格式，兼容全角花括号。
/// 未找到（或值为空）的变量保持原样并打印警告。
pub struct VariableResolver;

impl VariableResolver {
    /// 替换文本中的所有占位符
    pub fn substitute(text: &str, store: &VariableStore) -> String {
        // 全角花括号转半角，用例表格中手工录入时常见
        let normalized = text.replace('｛', "{").replace('｝', "}");

        let pass1 = Self::replace_with(&DOLLAR_REGEX, &normalized, store);
        let pass2 = Self::replace_with(&BRACE_REGEX, &pass1, store);

        if pass2 != text {
            debug!("变量替换: {} -> {}", text, pass2);
        }
        pass2
    }

    fn replace_with(re: &Regex, text: &str, store: &VariableStore) -> String {
        re.replace_all(text, |caps: &Captures| {
            let name = caps[1].trim();
            match store.get(name) {
                Some(value) if !value.is_empty() => value.to_string(),
                _ => {
                    warn!("变量 {} 未找到，占位符保持原样", name);
                    caps[0].to_string()
                }
            }
        })
        .to_string()
    }
}
