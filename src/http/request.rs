use serde::{Deserialize, Serialize};

use crate::http::types::Method;

/// 解析完成的具体请求
///
/// 所有模板都已替换完毕，可直接发送，也可无损写入报告。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSnapshot {
    pub method: Method,

    /// 绝对 URL
    pub url: String,

    /// Header 列表，保持声明顺序
    pub headers: Vec<(String, String)>,

    /// 请求体（可选）
    pub body: Option<String>,
}

impl RequestSnapshot {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}
