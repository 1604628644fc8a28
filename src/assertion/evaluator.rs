use regex::Regex;

use crate::assertion::extractor::lookup_value;
use crate::assertion::types::{ActualValue, AssertError, AssertionOutcome, Comparator};
use crate::collection::Assertion;
use crate::http::ResponseSnapshot;
use crate::variable::VariableStore;

/// 按声明顺序求值一个 Step 的全部断言
///
/// 不短路：即使某条失败，剩余断言仍然求值，
/// 失败的 Step 也要报告出每一条检查结果。
pub fn evaluate_assertions(
    assertions: &[Assertion],
    response: &ResponseSnapshot,
    store: &VariableStore,
) -> Vec<AssertionOutcome> {
    assertions
        .iter()
        .map(|assertion| evaluate_one(assertion, response, store))
        .collect()
}

fn evaluate_one(
    assertion: &Assertion,
    response: &ResponseSnapshot,
    store: &VariableStore,
) -> AssertionOutcome {
    let target = assertion.target.to_string();
    let comparator = assertion.comparator;
    let actual = lookup_value(response, &assertion.target);

    if comparator == Comparator::Exists {
        return match actual {
            Some(value) => {
                AssertionOutcome::pass(target, comparator, None, Some(value.to_string()))
            }
            None => AssertionOutcome::fail(
                target,
                comparator,
                None,
                None,
                format!(
                    "Expected {} to exist, but it was not found",
                    assertion.target
                ),
            ),
        };
    }

    // 期望值可能引用变量，先经过变量仓库解析
    let expected = match &assertion.expected {
        Some(raw) => match store.resolve(raw) {
            Ok(resolved) => resolved,
            Err(e) => {
                return AssertionOutcome::fail(
                    target,
                    comparator,
                    Some(raw.clone()),
                    actual.map(|v| v.to_string()),
                    e.to_string(),
                );
            }
        },
        None => {
            return AssertionOutcome::fail(
                target,
                comparator,
                None,
                actual.map(|v| v.to_string()),
                AssertError::MissingExpected(comparator.to_string()).to_string(),
            );
        }
    };

    let Some(actual) = actual else {
        return AssertionOutcome::fail(
            target,
            comparator,
            Some(expected.clone()),
            None,
            format!(
                "Expected {} to be {} {}, but it was not found",
                assertion.target, comparator, expected
            ),
        );
    };

    match compare(&actual, comparator, &expected) {
        Ok(true) => AssertionOutcome::pass(
            target,
            comparator,
            Some(expected),
            Some(actual.to_string()),
        ),
        Ok(false) => {
            let message = format!(
                "Expected {} to be {} {}, but got {}",
                assertion.target, comparator, expected, actual
            );
            AssertionOutcome::fail(
                target,
                comparator,
                Some(expected),
                Some(actual.to_string()),
                message,
            )
        }
        Err(e) => AssertionOutcome::fail(
            target,
            comparator,
            Some(expected),
            Some(actual.to_string()),
            e.to_string(),
        ),
    }
}

/// 应用比较器
///
/// equals 在两侧都是数字时按数值比较，异构类型强制转为字符串；
/// lessThan/greaterThan 要求两侧都是数字，否则 TypeMismatch。
fn compare(
    actual: &ActualValue,
    comparator: Comparator,
    expected: &str,
) -> Result<bool, AssertError> {
    match comparator {
        Comparator::Equals => {
            if let (Some(a), Ok(b)) = (actual.as_number(), expected.trim().parse::<f64>()) {
                Ok((a - b).abs() < f64::EPSILON)
            } else {
                Ok(actual.coerce_string() == expected)
            }
        }

        Comparator::LessThan | Comparator::GreaterThan => {
            let a = actual.as_number().ok_or_else(|| AssertError::TypeMismatch {
                expected: "number".to_string(),
                actual: actual.to_string(),
            })?;
            let b: f64 = expected
                .trim()
                .parse()
                .map_err(|_| AssertError::TypeMismatch {
                    expected: "number".to_string(),
                    actual: expected.to_string(),
                })?;
            Ok(match comparator {
                Comparator::LessThan => a < b,
                _ => a > b,
            })
        }

        Comparator::Matches => {
            let re = Regex::new(expected).map_err(|e| AssertError::InvalidPattern {
                pattern: expected.to_string(),
                message: e.to_string(),
            })?;
            Ok(re.is_match(&actual.coerce_string()))
        }

        // exists 在调用方处理
        Comparator::Exists => Ok(true),
    }
}
