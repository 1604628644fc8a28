use thiserror::Error;

#[derive(Error, Debug)]
pub enum PostrunError {
    #[error("集合无效 ({path}): {}", errors.join("; "))]
    InvalidCollection { path: String, errors: Vec<String> },

    #[error("环境配置错误: {0}")]
    InvalidEnvironment(String),

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
impl From<anyhow::Error> for PostrunError {
    fn from(err: anyhow::Error) -> Self {
        PostrunError::Other(err.to_string())
    }
}

/// Result type for postrun crate
pub type Result<T> = std::result::Result<T, PostrunError>;
