use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::http::types::Status;

/// 响应快照
///
/// Header 用有序 map 保存，序列化输出才是确定性的。
/// 非 UTF-8 的 header 值按空串处理。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSnapshot {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub duration_ms: u64,
}

impl ResponseSnapshot {
    pub fn from_parts(status: u16, headers: &HeaderMap, body: String, duration: Duration) -> Self {
        let headers = headers
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    v.to_str().unwrap_or("").to_string(),
                )
            })
            .collect();

        Self {
            status,
            headers,
            body,
            duration_ms: duration.as_millis() as u64,
        }
    }

    /// 大小写无关的 header 查找
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn status(&self) -> Status {
        Status::new(self.status)
    }

    pub fn is_success(&self) -> bool {
        self.status().is_success()
    }
}
