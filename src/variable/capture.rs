use crate::assertion::{ActualValue, lookup_body_path};
use crate::collection::{Extraction, Source};
use crate::http::ResponseSnapshot;
use crate::variable::store::{Value, VariableStore};

/// 提取失败
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    #[error("Extraction '{name}' failed: {source_desc} not found in response")]
    NotFound { name: String, source_desc: String },

    #[error("Extraction '{name}' failed: {source_desc} is null")]
    NullValue { name: String, source_desc: String },
}

/// 一个 Step 的提取结果统计
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureReport {
    pub succeeded: usize,
    pub failures: Vec<String>,
}

impl CaptureReport {
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// 按声明顺序应用提取规则，写入变量仓库
///
/// 尽力而为：某条失败后剩余规则继续应用，
/// 后续 Step 能拿到的上下文越多越好。
pub fn apply_extractions(
    extractions: &[Extraction],
    response: &ResponseSnapshot,
    store: &mut VariableStore,
) -> CaptureReport {
    let mut report = CaptureReport::default();

    for extraction in extractions {
        let located = match &extraction.source {
            Source::Body(segments) => lookup_body_path(&response.body, segments),
            Source::Header(name) => response
                .header(name)
                .map(|value| ActualValue::String(value.to_string())),
        };

        match located {
            Some(ActualValue::Null) => {
                report.failures.push(
                    CaptureError::NullValue {
                        name: extraction.name.clone(),
                        source_desc: extraction.source.to_string(),
                    }
                    .to_string(),
                );
            }
            Some(value) => {
                store.set(extraction.name.clone(), actual_to_value(value));
                report.succeeded += 1;
            }
            None => {
                report.failures.push(
                    CaptureError::NotFound {
                        name: extraction.name.clone(),
                        source_desc: extraction.source.to_string(),
                    }
                    .to_string(),
                );
            }
        }
    }

    report
}

fn actual_to_value(actual: ActualValue) -> Value {
    match actual {
        ActualValue::Number(n) => Value::Number(n),
        ActualValue::String(s) => Value::String(s),
        ActualValue::Bool(b) => Value::Bool(b),
        // Null 在调用方已转为失败
        ActualValue::Null => Value::String("null".to_string()),
    }
}
