use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 断言求值错误
#[derive(Debug, thiserror::Error)]
pub enum AssertError {
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Missing expected value for comparator '{0}'")]
    MissingExpected(String),
}

/// 断言目标 - 从响应中取实际值的位置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Target {
    /// HTTP 状态码
    Status,
    /// 响应 Header（大小写无关）
    Header(String),
    /// JSON Body 路径（点号分隔的路径段）
    Body(Vec<String>),
}

/// 目标路径解析失败
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "Invalid target '{0}'. Must be 'status', 'headers.<name>', or 'body.<path>'"
)]
pub struct InvalidTarget(pub String);

impl FromStr for Target {
    type Err = InvalidTarget;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();

        if input == "status" {
            return Ok(Target::Status);
        }

        if let Some(rest) = input.strip_prefix("headers.") {
            if rest.is_empty() {
                return Err(InvalidTarget(s.to_string()));
            }
            return Ok(Target::Header(rest.to_string()));
        }

        if let Some(rest) = input.strip_prefix("body.") {
            let segments: Vec<String> = rest.split('.').map(|seg| seg.to_string()).collect();
            if segments.iter().any(|seg| seg.is_empty()) {
                return Err(InvalidTarget(s.to_string()));
            }
            return Ok(Target::Body(segments));
        }

        Err(InvalidTarget(s.to_string()))
    }
}

impl TryFrom<String> for Target {
    type Error = InvalidTarget;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Target> for String {
    fn from(target: Target) -> Self {
        target.to_string()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Status => write!(f, "status"),
            Target::Header(name) => write!(f, "headers.{}", name),
            Target::Body(segments) => write!(f, "body.{}", segments.join(".")),
        }
    }
}

/// 比较器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Comparator {
    Equals,
    LessThan,
    GreaterThan,
    Matches,
    Exists,
}

impl Comparator {
    /// 从字符串解析比较器
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "equals" => Some(Self::Equals),
            "lessThan" => Some(Self::LessThan),
            "greaterThan" => Some(Self::GreaterThan),
            "matches" => Some(Self::Matches),
            "exists" => Some(Self::Exists),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Comparator::Equals => "equals",
            Comparator::LessThan => "lessThan",
            Comparator::GreaterThan => "greaterThan",
            Comparator::Matches => "matches",
            Comparator::Exists => "exists",
        }
    }

    /// exists 不需要期望值，其余比较器都需要
    pub fn requires_expected(&self) -> bool {
        !matches!(self, Comparator::Exists)
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 从响应中取到的实际值
#[derive(Debug, Clone, PartialEq)]
pub enum ActualValue {
    Number(f64),
    String(String),
    Bool(bool),
    Null,
}

impl ActualValue {
    /// 数字视图：数字本身，或能解析为数字的字符串
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ActualValue::Number(n) => Some(*n),
            ActualValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// 字符串强制转换，用于异构类型的 equals 和 matches
    pub fn coerce_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ActualValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActualValue::Number(n) if n.fract() == 0.0 && n.is_finite() => {
                write!(f, "{}", *n as i64)
            }
            ActualValue::Number(n) => write!(f, "{}", n),
            ActualValue::String(s) => write!(f, "{}", s),
            ActualValue::Bool(b) => write!(f, "{}", b),
            ActualValue::Null => write!(f, "null"),
        }
    }
}

/// 单条断言的求值结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssertionOutcome {
    /// 目标描述，如 "body.user.id"
    pub target: String,

    pub comparator: Comparator,

    /// 解析后的期望值（exists 没有）
    pub expected: Option<String>,

    /// 实际值的字符串表示（缺失时为 None）
    pub actual: Option<String>,

    pub passed: bool,

    /// 失败消息
    pub message: Option<String>,
}

impl AssertionOutcome {
    pub fn pass(
        target: String,
        comparator: Comparator,
        expected: Option<String>,
        actual: Option<String>,
    ) -> Self {
        Self {
            target,
            comparator,
            expected,
            actual,
            passed: true,
            message: None,
        }
    }

    pub fn fail(
        target: String,
        comparator: Comparator,
        expected: Option<String>,
        actual: Option<String>,
        message: String,
    ) -> Self {
        Self {
            target,
            comparator,
            expected,
            actual,
            passed: false,
            message: Some(message),
        }
    }
}
