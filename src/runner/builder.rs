use crate::collection::Step;
use crate::http::RequestSnapshot;
use crate::variable::{UnresolvedVariable, VariableStore};

/// 请求构建错误，只让所在 Step 失败
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Failed to resolve {part}: {source}")]
    Template {
        part: String,
        source: UnresolvedVariable,
    },

    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },
}

/// 请求构建器
///
/// 对变量仓库当前快照做纯函数式解析，同一 Step 的解析结果是确定的。
pub struct RequestBuilder;

impl RequestBuilder {
    pub fn build(step: &Step, store: &VariableStore) -> Result<RequestSnapshot, BuildError> {
        let url = store.resolve(&step.url).map_err(|e| BuildError::Template {
            part: "url".to_string(),
            source: e,
        })?;

        // 要求绝对 URL，相对路径在这里报错而不是发请求时
        let parsed = url::Url::parse(&url).map_err(|e| BuildError::InvalidUrl {
            url: url.clone(),
            message: e.to_string(),
        })?;
        if !parsed.has_host() {
            return Err(BuildError::InvalidUrl {
                url,
                message: "missing host".to_string(),
            });
        }

        let mut headers = Vec::with_capacity(step.headers.len());
        for (key, template) in &step.headers {
            let value = store.resolve(template).map_err(|e| BuildError::Template {
                part: format!("header '{}'", key),
                source: e,
            })?;
            headers.push((key.clone(), value));
        }

        let body = match &step.body {
            Some(template) => Some(store.resolve(template).map_err(|e| BuildError::Template {
                part: "body".to_string(),
                source: e,
            })?),
            None => None,
        };

        Ok(RequestSnapshot {
            method: step.method,
            url,
            headers,
            body,
        })
    }
}
