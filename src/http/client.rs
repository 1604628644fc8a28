use std::time::{Duration, Instant};

use crate::http::request::RequestSnapshot;
use crate::http::response::ResponseSnapshot;
use crate::http::types::Method;

/// 传输层错误
///
/// 两种情况都只终止所在 Step，从不终止整个 Run。
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Network error: {0}")]
    Network(String),
}

/// 请求执行器
///
/// 负责发送请求并测量耗时；不做任何重试，
/// 重试策略由 RunCoordinator 显式控制。
#[derive(Clone)]
pub struct Executor {
    inner: reqwest::Client,
    timeout: Duration,
}

impl Executor {
    pub fn new(timeout: Duration) -> Self {
        Self {
            inner: reqwest::Client::builder()
                .build()
                .expect("Failed to build HTTP client"),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn execute(&self, request: &RequestSnapshot) -> Result<ResponseSnapshot, ExecError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
            Method::Patch => reqwest::Method::PATCH,
            Method::Head => reqwest::Method::HEAD,
            Method::Options => reqwest::Method::OPTIONS,
        };

        let mut req = self
            .inner
            .request(method, request.url.clone())
            .timeout(self.timeout);

        for (key, value) in &request.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        if let Some(body) = &request.body {
            req = req.body(body.clone());
        }

        let start = Instant::now();
        let response = req.send().await.map_err(|e| self.map_error(e))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(|e| self.map_error(e))?;
        let duration = start.elapsed();

        Ok(ResponseSnapshot::from_parts(status, &headers, body, duration))
    }

    fn map_error(&self, error: reqwest::Error) -> ExecError {
        if error.is_timeout() {
            ExecError::Timeout(self.timeout)
        } else {
            ExecError::Network(error.to_string())
        }
    }
}
