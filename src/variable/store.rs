use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// 模板中引用了未绑定的变量
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unresolved variable '${{{name}}}'")]
pub struct UnresolvedVariable {
    pub name: String,
}

/// 变量值，支持字符串、数字和布尔
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Number(f64),
    Bool(bool),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            // 整数值不带小数点输出，替换进 URL 时需要 "42" 而不是 "42.0"
            Value::Number(n) if n.fract() == 0.0 && n.is_finite() => write!(f, "{}", *n as i64),
            Value::Number(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// 变量仓库，作用域为单次 Run
///
/// 只有预置种子和提取规则会写入；`get`/`resolve` 无副作用。
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    variables: HashMap<String, Value>,
}

static VAR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([a-zA-Z_][a-zA-Z0-9_]*)\}").unwrap());

impl VariableStore {
    /// 创建新的空变量仓库
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置变量，同名无条件覆盖
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(key.into(), value.into());
    }

    /// 获取变量值
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.variables.get(key)
    }

    /// 批量插入变量
    pub fn extend(&mut self, vars: impl IntoIterator<Item = (String, Value)>) {
        self.variables.extend(vars);
    }

    /// 变量数量
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// 替换模板中的所有 ${name} 占位符
    ///
    /// 任何一个占位符未绑定都会失败，而不是原样保留，
    /// 这样 Step 的解析结果要么完整要么明确报错。
    pub fn resolve(&self, template: &str) -> Result<String, UnresolvedVariable> {
        let mut output = String::with_capacity(template.len());
        let mut last = 0;

        for caps in VAR_REGEX.captures_iter(template) {
            let placeholder = caps.get(0).unwrap();
            let name = &caps[1];
            let value = self.variables.get(name).ok_or_else(|| UnresolvedVariable {
                name: name.to_string(),
            })?;
            output.push_str(&template[last..placeholder.start()]);
            output.push_str(&value.to_string());
            last = placeholder.end();
        }

        output.push_str(&template[last..]);
        Ok(output)
    }
}
