use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::assertion::{Comparator, Target};
use crate::collection::types::{Collection, Source};
use crate::error::{PostrunError, Result};
use crate::http::Method;

/// 合法的变量名
static NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").unwrap());

/// 从文件路径加载集合
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Collection> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    load_str(&content, &path.display().to_string())
}

/// 从字符串内容加载集合
///
/// 校验收集到的是全部结构错误，不是第一个。
pub fn load_str(content: &str, origin: &str) -> Result<Collection> {
    let root: Value = serde_json::from_str(content).map_err(|e| {
        PostrunError::InvalidCollection {
            path: origin.to_string(),
            errors: vec![format!("not valid JSON: {}", e)],
        }
    })?;

    let errors = validate(&root);
    if !errors.is_empty() {
        return Err(PostrunError::InvalidCollection {
            path: origin.to_string(),
            errors,
        });
    }

    serde_json::from_value(root).map_err(|e| PostrunError::InvalidCollection {
        path: origin.to_string(),
        errors: vec![e.to_string()],
    })
}

fn validate(root: &Value) -> Vec<String> {
    let mut errors = Vec::new();

    let Some(obj) = root.as_object() else {
        return vec!["root: must be an object".to_string()];
    };

    match obj.get("name") {
        Some(Value::String(s)) if !s.trim().is_empty() => {}
        Some(Value::String(_)) => errors.push("name: must not be empty".to_string()),
        Some(_) => errors.push("name: must be a string".to_string()),
        None => errors.push("name: missing".to_string()),
    }

    for key in obj.keys() {
        if !matches!(key.as_str(), "name" | "steps") {
            errors.push(format!("unknown field '{}'", key));
        }
    }

    match obj.get("steps") {
        Some(Value::Array(steps)) => {
            for (index, step) in steps.iter().enumerate() {
                validate_step(step, index, &mut errors);
            }
        }
        Some(_) => errors.push("steps: must be an array".to_string()),
        // 缺省为空集合
        None => {}
    }

    errors
}

fn validate_step(step: &Value, index: usize, errors: &mut Vec<String>) {
    let ctx = format!("steps[{}]", index);

    let Some(obj) = step.as_object() else {
        errors.push(format!("{}: must be an object", ctx));
        return;
    };

    for key in obj.keys() {
        if !matches!(
            key.as_str(),
            "name" | "method" | "url" | "headers" | "body" | "assertions" | "extractions"
        ) {
            errors.push(format!("{}: unknown field '{}'", ctx, key));
        }
    }

    match obj.get("name") {
        None | Some(Value::Null) | Some(Value::String(_)) => {}
        Some(_) => errors.push(format!("{}.name: must be a string", ctx)),
    }

    match obj.get("method") {
        Some(value @ Value::String(s)) => {
            // 与反序列化同一套校验，大小写敏感
            if serde_json::from_value::<Method>(value.clone()).is_err() {
                errors.push(format!("{}.method: invalid HTTP method '{}'", ctx, s));
            }
        }
        Some(_) => errors.push(format!("{}.method: must be a string", ctx)),
        None => errors.push(format!("{}.method: missing", ctx)),
    }

    match obj.get("url") {
        Some(Value::String(s)) if !s.trim().is_empty() => {}
        Some(Value::String(_)) => errors.push(format!("{}.url: must not be empty", ctx)),
        Some(_) => errors.push(format!("{}.url: must be a string", ctx)),
        None => errors.push(format!("{}.url: missing", ctx)),
    }

    match obj.get("headers") {
        None | Some(Value::Null) => {}
        Some(Value::Object(headers)) => {
            for (key, value) in headers {
                if !value.is_string() {
                    errors.push(format!("{}.headers.{}: value must be a string", ctx, key));
                }
            }
        }
        Some(_) => errors.push(format!("{}.headers: must be an object", ctx)),
    }

    match obj.get("body") {
        None | Some(Value::Null) | Some(Value::String(_)) => {}
        Some(_) => errors.push(format!("{}.body: must be a string", ctx)),
    }

    match obj.get("assertions") {
        None | Some(Value::Null) => {}
        Some(Value::Array(assertions)) => {
            for (j, assertion) in assertions.iter().enumerate() {
                validate_assertion(assertion, &ctx, j, errors);
            }
        }
        Some(_) => errors.push(format!("{}.assertions: must be an array", ctx)),
    }

    match obj.get("extractions") {
        None | Some(Value::Null) => {}
        Some(Value::Array(extractions)) => {
            for (j, extraction) in extractions.iter().enumerate() {
                validate_extraction(extraction, &ctx, j, errors);
            }
        }
        Some(_) => errors.push(format!("{}.extractions: must be an array", ctx)),
    }
}

fn validate_assertion(assertion: &Value, step_ctx: &str, index: usize, errors: &mut Vec<String>) {
    let ctx = format!("{}.assertions[{}]", step_ctx, index);

    let Some(obj) = assertion.as_object() else {
        errors.push(format!("{}: must be an object", ctx));
        return;
    };

    for key in obj.keys() {
        if !matches!(key.as_str(), "target" | "comparator" | "expected") {
            errors.push(format!("{}: unknown field '{}'", ctx, key));
        }
    }

    match obj.get("target") {
        Some(Value::String(s)) => {
            if let Err(e) = s.parse::<Target>() {
                errors.push(format!("{}.target: {}", ctx, e));
            }
        }
        Some(_) => errors.push(format!("{}.target: must be a string", ctx)),
        None => errors.push(format!("{}.target: missing", ctx)),
    }

    let comparator = match obj.get("comparator") {
        Some(Value::String(s)) => match Comparator::parse(s) {
            Some(cmp) => Some(cmp),
            None => {
                errors.push(format!("{}.comparator: unknown comparator '{}'", ctx, s));
                None
            }
        },
        Some(_) => {
            errors.push(format!("{}.comparator: must be a string", ctx));
            None
        }
        None => {
            errors.push(format!("{}.comparator: missing", ctx));
            None
        }
    };

    let expected = obj.get("expected");
    match expected {
        None | Some(Value::Null) => {
            if let Some(cmp) = comparator {
                if cmp.requires_expected() {
                    errors.push(format!("{}.expected: missing (required by '{}')", ctx, cmp));
                }
            }
        }
        Some(Value::String(_)) => {
            if comparator == Some(Comparator::Exists) {
                errors.push(format!("{}.expected: not allowed for 'exists'", ctx));
            }
        }
        Some(_) => errors.push(format!("{}.expected: must be a string", ctx)),
    }
}

fn validate_extraction(extraction: &Value, step_ctx: &str, index: usize, errors: &mut Vec<String>) {
    let ctx = format!("{}.extractions[{}]", step_ctx, index);

    let Some(obj) = extraction.as_object() else {
        errors.push(format!("{}: must be an object", ctx));
        return;
    };

    for key in obj.keys() {
        if !matches!(key.as_str(), "source" | "name") {
            errors.push(format!("{}: unknown field '{}'", ctx, key));
        }
    }

    match obj.get("source") {
        Some(Value::String(s)) => {
            if let Err(e) = s.parse::<Source>() {
                errors.push(format!("{}.source: {}", ctx, e));
            }
        }
        Some(_) => errors.push(format!("{}.source: must be a string", ctx)),
        None => errors.push(format!("{}.source: missing", ctx)),
    }

    match obj.get("name") {
        Some(Value::String(s)) => {
            if !NAME_REGEX.is_match(s) {
                errors.push(format!("{}.name: invalid variable name '{}'", ctx, s));
            }
        }
        Some(_) => errors.push(format!("{}.name: must be a string", ctx)),
        None => errors.push(format!("{}.name: missing", ctx)),
    }
}
