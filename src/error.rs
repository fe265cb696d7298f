use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApicaseError {
    #[error("解析错误: {0}")]
    ParseError(String),

    #[error("用例文件错误: {0}")]
    CaseFileError(String),

    #[error("配置错误: {0}")]
    ConfigError(String),

    #[error("无效的 URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP 请求失败: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("网络错误: {0}")]
    NetworkError(String),

    #[error("IO 错误: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON 解析错误: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("URL 解析错误: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("{0}")]
    Other(String),
}

// Add conversion from anyhow::Error
impl From<anyhow::Error> for ApicaseError {
    fn from(err: anyhow::Error) -> Self {
        ApicaseError::Other(err.to_string())
    }
}

/// Result type for apicase crate
pub type Result<T> = std::result::Result<T, ApicaseError>;
