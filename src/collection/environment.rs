use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{PostrunError, Result};
use crate::variable::{Value, VariableStore};

/// 环境文件：一次 Run 的种子变量 (TOML)
///
/// 凭据等敏感值走这里注入，核心不读取进程环境变量。
///
/// ```toml
/// name = "staging"
///
/// [variables]
/// base_url = "https://api.example.com"
/// api_key = "secret"
/// retries = 3
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Environment {
    /// 环境名称（可选，仅用于日志）
    #[serde(default)]
    pub name: Option<String>,

    /// 变量映射
    #[serde(default)]
    pub variables: HashMap<String, Value>,
}

impl Environment {
    /// 从指定路径加载环境文件
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            PostrunError::InvalidEnvironment(format!(
                "failed to read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        toml::from_str(&content)
            .map_err(|e| PostrunError::InvalidEnvironment(e.to_string()))
    }

    /// 构建变量仓库
    ///
    /// 先放环境文件的种子值，再应用 CLI 覆盖（--var key=value，优先级最高）。
    pub fn seed_store(&self, cli_vars: &[(String, String)]) -> VariableStore {
        let mut store = VariableStore::new();

        for (key, value) in &self.variables {
            store.set(key.clone(), value.clone());
        }

        for (key, value) in cli_vars {
            store.set(key.clone(), value.clone());
        }

        store
    }

    /// 解析 CLI 变量参数 "key=value"
    pub fn parse_cli_var(s: &str) -> Option<(String, String)> {
        s.split_once('=')
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_from_path() {
        let content = r#"
name = "staging"

[variables]
base_url = "http://localhost:8080"
api_key = "dev-key"
retries = 3
verbose = true
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let environment = Environment::load_from_path(temp_file.path()).unwrap();
        assert_eq!(environment.name.as_deref(), Some("staging"));
        assert_eq!(
            environment.variables.get("base_url"),
            Some(&Value::String("http://localhost:8080".to_string()))
        );
        assert_eq!(environment.variables.get("retries"), Some(&Value::Number(3.0)));
        assert_eq!(environment.variables.get("verbose"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Environment::load_from_path("/nonexistent/env.toml").unwrap_err();
        assert!(matches!(err, PostrunError::InvalidEnvironment(_)));
    }

    #[test]
    fn test_seed_store_with_overrides() {
        let environment: Environment = toml::from_str(
            r#"
[variables]
base_url = "http://localhost:8080"
token = "env-token"
"#,
        )
        .unwrap();

        let overrides = vec![("token".to_string(), "cli-token".to_string())];
        let store = environment.seed_store(&overrides);

        assert_eq!(
            store.get("base_url"),
            Some(&Value::String("http://localhost:8080".to_string()))
        );
        assert_eq!(store.get("token"), Some(&Value::String("cli-token".to_string())));
    }

    #[test]
    fn test_parse_cli_var() {
        assert_eq!(
            Environment::parse_cli_var("key=value"),
            Some(("key".to_string(), "value".to_string()))
        );
        assert_eq!(
            Environment::parse_cli_var("url=https://example.com"),
            Some(("url".to_string(), "https://example.com".to_string()))
        );
        assert_eq!(Environment::parse_cli_var("invalid"), None);
    }
}
