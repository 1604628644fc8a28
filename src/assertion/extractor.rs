use crate::assertion::types::{ActualValue, Target};
use crate::http::ResponseSnapshot;

/// 按目标从响应中取实际值
///
/// 缺失（header 不存在、body 不是 JSON、路径不通）一律返回 None，
/// 由调用方决定是断言失败还是 exists 判定。
pub fn lookup_value(response: &ResponseSnapshot, target: &Target) -> Option<ActualValue> {
    match target {
        Target::Status => Some(ActualValue::Number(response.status as f64)),

        Target::Header(name) => response
            .header(name)
            .map(|value| ActualValue::String(value.to_string())),

        Target::Body(segments) => lookup_body_path(&response.body, segments),
    }
}

/// 从 JSON body 中按点号路径取值
///
/// 路径段优先作为对象 key；取数组元素时把段解析为下标。
pub(crate) fn lookup_body_path(body: &str, segments: &[String]) -> Option<ActualValue> {
    let root: serde_json::Value = serde_json::from_str(body).ok()?;

    let mut current = &root;
    for segment in segments {
        current = match current {
            serde_json::Value::Object(map) => map.get(segment)?,
            serde_json::Value::Array(items) => {
                let index: usize = segment.parse().ok()?;
                items.get(index)?
            }
            _ => return None,
        };
    }

    Some(json_to_actual(current))
}

fn json_to_actual(value: &serde_json::Value) -> ActualValue {
    match value {
        serde_json::Value::Number(n) => ActualValue::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => ActualValue::String(s.clone()),
        serde_json::Value::Bool(b) => ActualValue::Bool(*b),
        serde_json::Value::Null => ActualValue::Null,
        // 复合值按紧凑 JSON 文本参与比较
        other => ActualValue::String(other.to_string()),
    }
}
