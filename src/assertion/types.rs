/// 断言错误类型
#[derive(Debug, thiserror::Error)]
pub enum AssertError {
    #[error("Invalid expected value: {0}")]
    InvalidValue(String),

    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(String),

    #[error("Response is not valid JSON: {0}")]
    NotJson(String),
}

/// 断言结果
#[derive(Debug, Clone)]
pub struct AssertionResult {
    /// 断言描述（类型 + 参数原文）
    pub raw: String,

    /// 是否通过
    pub passed: bool,

    /// 实际值（字符串表示）
    pub actual: Option<String>,

    /// 期望描述
    pub expected: String,

    /// 失败消息
    pub message: Option<String>,
}

impl AssertionResult {
    /// 创建成功的断言结果
    pub fn success(raw: String, actual: String, expected: String) -> Self {
        Self {
            raw,
            passed: true,
            actual: Some(actual),
            expected,
            message: None,
        }
    }

    /// 创建失败的断言结果
    pub fn failure(raw: String, actual: String, expected: String, message: String) -> Self {
        Self {
            raw,
            passed: false,
            actual: Some(actual),
            expected,
            message: Some(message),
        }
    }

    /// 创建错误的断言结果（解析或执行错误）
    pub fn error(raw: String, error: AssertError) -> Self {
        Self {
            raw,
            passed: false,
            actual: None,
            expected: String::new(),
            message: Some(error.to_string()),
        }
    }
}
