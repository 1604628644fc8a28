use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::assertion::{Comparator, Target};
use crate::http::Method;

/// 一份测试集合：有名字的有序 Step 序列
///
/// 从声明式 JSON 文件加载，Run 期间不可变。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub name: String,

    #[serde(default)]
    pub steps: Vec<Step>,
}

/// 单个 HTTP 交换的声明
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Step 名称（可选，缺省按序号显示）
    #[serde(default)]
    pub name: Option<String>,

    pub method: Method,

    /// URL 模板，可引用 ${variable}
    pub url: String,

    /// Header 模板，值可引用变量
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// 请求体模板（可选）
    #[serde(default)]
    pub body: Option<String>,

    /// 断言列表，按声明顺序求值
    #[serde(default)]
    pub assertions: Vec<Assertion>,

    /// 提取规则列表，按声明顺序应用
    #[serde(default)]
    pub extractions: Vec<Extraction>,
}

impl Step {
    /// 显示名称：声明的名字，或 "step N"
    pub fn display_name(&self, step_number: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("step {}", step_number))
    }
}

/// 一条声明式断言
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assertion {
    pub target: Target,

    pub comparator: Comparator,

    /// 期望值模板（exists 不需要）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
}

/// 一条提取规则：响应中的来源 → 变量名
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub source: Source,

    /// 目标变量名
    pub name: String,
}

/// 提取来源
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Source {
    /// JSON Body 路径
    /// 示例: body.token, body.user.id
    Body(Vec<String>),

    /// 响应 Header
    /// 示例: headers.X-Request-Id
    Header(String),
}

/// 提取来源解析失败
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid source '{0}'. Must be 'body.<path>' or 'headers.<name>'")]
pub struct InvalidSource(pub String);

impl FromStr for Source {
    type Err = InvalidSource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();

        if let Some(rest) = input.strip_prefix("body.") {
            let segments: Vec<String> = rest.split('.').map(|seg| seg.to_string()).collect();
            if segments.iter().any(|seg| seg.is_empty()) {
                return Err(InvalidSource(s.to_string()));
            }
            return Ok(Source::Body(segments));
        }

        if let Some(rest) = input.strip_prefix("headers.") {
            if rest.is_empty() {
                return Err(InvalidSource(s.to_string()));
            }
            return Ok(Source::Header(rest.to_string()));
        }

        Err(InvalidSource(s.to_string()))
    }
}

impl TryFrom<String> for Source {
    type Error = InvalidSource;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Source> for String {
    fn from(source: Source) -> Self {
        source.to_string()
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Body(segments) => write!(f, "body.{}", segments.join(".")),
            Source::Header(name) => write!(f, "headers.{}", name),
        }
    }
}
