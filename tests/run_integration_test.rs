use std::time::Duration;

use postrun::collection::Collection;
use postrun::runner::{RunConfig, RunCoordinator, RunState, StepOutcome};
use postrun::variable::{Value, VariableStore};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn collection_from(json: serde_json::Value) -> Collection {
    serde_json::from_value(json).unwrap()
}

fn config() -> RunConfig {
    RunConfig {
        timeout: Duration::from_secs(5),
        attempts: 1,
        fail_fast: false,
    }
}

/// 测试完整链式流程：POST 创建提取 id，GET 用 ${id} 回查
#[tokio::test]
async fn test_create_then_get_chaining() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/items"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 42
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/items/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 42,
            "status": "stored"
        })))
        .mount(&mock_server)
        .await;

    let collection = collection_from(serde_json::json!({
        "name": "chaining",
        "steps": [
            {
                "name": "create item",
                "method": "POST",
                "url": "${base_url}/items",
                "headers": { "Content-Type": "application/json" },
                "body": "{\"kind\": \"widget\"}",
                "assertions": [
                    { "target": "status", "comparator": "equals", "expected": "200" }
                ],
                "extractions": [
                    { "source": "body.id", "name": "id" }
                ]
            },
            {
                "name": "get item",
                "method": "GET",
                "url": "${base_url}/items/${id}",
                "assertions": [
                    { "target": "status", "comparator": "equals", "expected": "200" },
                    { "target": "body.id", "comparator": "equals", "expected": "${id}" }
                ]
            }
        ]
    }));

    let mut store = VariableStore::new();
    store.set("base_url", mock_server.uri());

    let coordinator = RunCoordinator::new(config());
    let run = coordinator.run(&collection, &mut store).await;

    assert_eq!(run.state, RunState::Completed);
    assert_eq!(run.totals.total, 2);
    assert_eq!(run.totals.passed, 2);
    assert_eq!(run.totals.failed, 0);

    // 提取后的变量留在仓库里
    assert_eq!(store.get("id"), Some(&Value::Number(42.0)));
}

/// 测试断言失败：status equals 200 遇到 404，记录双方的值而不是抛出
#[tokio::test]
async fn test_failed_assertion_records_expected_and_actual() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let collection = collection_from(serde_json::json!({
        "name": "assertion-failure",
        "steps": [{
            "method": "GET",
            "url": "${base_url}/missing",
            "assertions": [
                { "target": "status", "comparator": "equals", "expected": "200" }
            ]
        }]
    }));

    let mut store = VariableStore::new();
    store.set("base_url", mock_server.uri());

    let run = RunCoordinator::new(config()).run(&collection, &mut store).await;

    assert_eq!(run.totals.failed, 1);
    let step = &run.steps[0];
    assert_eq!(step.outcome, StepOutcome::Failed);

    let outcome = &step.assertions[0];
    assert!(!outcome.passed);
    assert_eq!(outcome.expected.as_deref(), Some("200"));
    assert_eq!(outcome.actual.as_deref(), Some("404"));
    assert!(outcome.message.is_some());
}

/// 测试提取缺失字段：Step 失败但 Run 继续
#[tokio::test]
async fn test_missing_extraction_fails_step_but_run_continues() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/first"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/second"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let collection = collection_from(serde_json::json!({
        "name": "extraction-miss",
        "steps": [
            {
                "method": "GET",
                "url": "${base_url}/first",
                "assertions": [
                    { "target": "status", "comparator": "equals", "expected": "200" }
                ],
                "extractions": [
                    { "source": "body.token", "name": "token" }
                ]
            },
            {
                "method": "GET",
                "url": "${base_url}/second",
                "assertions": [
                    { "target": "body.ok", "comparator": "equals", "expected": "true" }
                ]
            }
        ]
    }));

    let mut store = VariableStore::new();
    store.set("base_url", mock_server.uri());

    let run = RunCoordinator::new(config()).run(&collection, &mut store).await;

    // 第一步断言全过但提取失败 → Step 失败
    assert_eq!(run.steps[0].outcome, StepOutcome::Failed);
    assert!(run.steps[0].assertions[0].passed);
    assert_eq!(run.steps[0].extraction_failures.len(), 1);

    // 非 fail-fast，第二步照常执行并通过
    assert_eq!(run.steps[1].outcome, StepOutcome::Passed);
    assert_eq!(run.totals.passed, 1);
    assert_eq!(run.totals.failed, 1);
}

/// 测试 fail-fast：第 k 步失败后恰好执行了 k 步，剩余标记 Skipped
#[tokio::test]
async fn test_fail_fast_skips_remaining_steps() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let steps = serde_json::json!([
        {
            "method": "GET",
            "url": "${base_url}/ok",
            "assertions": [{ "target": "status", "comparator": "equals", "expected": "200" }]
        },
        {
            "method": "GET",
            "url": "${base_url}/broken",
            "assertions": [{ "target": "status", "comparator": "equals", "expected": "200" }]
        },
        {
            "method": "GET",
            "url": "${base_url}/ok",
            "assertions": [{ "target": "status", "comparator": "equals", "expected": "200" }]
        },
        {
            "method": "GET",
            "url": "${base_url}/ok",
            "assertions": [{ "target": "status", "comparator": "equals", "expected": "200" }]
        }
    ]);

    let collection = collection_from(serde_json::json!({ "name": "ff", "steps": steps }));

    // fail-fast 开
    let mut store = VariableStore::new();
    store.set("base_url", mock_server.uri());
    let run = RunCoordinator::new(RunConfig {
        fail_fast: true,
        ..config()
    })
    .run(&collection, &mut store)
    .await;

    assert_eq!(run.totals.total, 4);
    assert_eq!(run.totals.passed, 1);
    assert_eq!(run.totals.failed, 1);
    assert_eq!(run.totals.skipped, 2);
    assert_eq!(run.steps[2].outcome, StepOutcome::Skipped);
    assert_eq!(run.steps[3].outcome, StepOutcome::Skipped);

    // fail-fast 关：全部执行
    let mut store = VariableStore::new();
    store.set("base_url", mock_server.uri());
    let run = RunCoordinator::new(config()).run(&collection, &mut store).await;

    assert_eq!(run.totals.skipped, 0);
    assert_eq!(run.totals.passed, 3);
    assert_eq!(run.totals.failed, 1);
}

/// 测试空集合：total/passed/failed 全为 0，状态 Completed
#[tokio::test]
async fn test_empty_collection_completes() {
    let collection = collection_from(serde_json::json!({ "name": "empty", "steps": [] }));

    let mut store = VariableStore::new();
    let run = RunCoordinator::new(config()).run(&collection, &mut store).await;

    assert_eq!(run.state, RunState::Completed);
    assert_eq!(run.totals.total, 0);
    assert_eq!(run.totals.passed, 0);
    assert_eq!(run.totals.failed, 0);
}

/// 测试提取的可见性：Step i 提取的变量对 i+1 可见，对 i 自己不可见
#[tokio::test]
async fn test_extraction_visible_to_next_step_only() {
    let mock_server = MockServer::start().await;

    // 第一步用种子值 1 访问，响应给出新 id 42
    Mock::given(method("GET"))
        .and(path("/items/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "next_id": 42
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/items/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&mock_server)
        .await;

    let collection = collection_from(serde_json::json!({
        "name": "visibility",
        "steps": [
            {
                "method": "GET",
                "url": "${base_url}/items/${id}",
                "assertions": [{ "target": "status", "comparator": "equals", "expected": "200" }],
                "extractions": [{ "source": "body.next_id", "name": "id" }]
            },
            {
                "method": "GET",
                "url": "${base_url}/items/${id}",
                "assertions": [{ "target": "status", "comparator": "equals", "expected": "200" }]
            }
        ]
    }));

    let mut store = VariableStore::new();
    store.set("base_url", mock_server.uri());
    store.set("id", 1i64);

    let run = RunCoordinator::new(config()).run(&collection, &mut store).await;

    // 第一步仍按种子值 1 解析（mock 只挂在 /items/1 上），
    // 第二步按提取出的 42 解析
    assert_eq!(run.totals.passed, 2);
    assert_eq!(
        run.steps[0].request.as_ref().unwrap().url,
        format!("{}/items/1", mock_server.uri())
    );
    assert_eq!(
        run.steps[1].request.as_ref().unwrap().url,
        format!("{}/items/42", mock_server.uri())
    );
    assert_eq!(store.get("id"), Some(&Value::Number(42.0)));
}

/// 测试未绑定变量：只有该 Step 失败，零断言被求值
#[tokio::test]
async fn test_unresolved_variable_fails_only_that_step() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let collection = collection_from(serde_json::json!({
        "name": "unresolved",
        "steps": [
            {
                "method": "GET",
                "url": "${base_url}/items/${undefined_id}",
                "assertions": [{ "target": "status", "comparator": "equals", "expected": "200" }]
            },
            {
                "method": "GET",
                "url": "${base_url}/health",
                "assertions": [{ "target": "status", "comparator": "equals", "expected": "200" }]
            }
        ]
    }));

    let mut store = VariableStore::new();
    store.set("base_url", mock_server.uri());

    let run = RunCoordinator::new(config()).run(&collection, &mut store).await;

    let first = &run.steps[0];
    assert_eq!(first.outcome, StepOutcome::Failed);
    assert!(first.assertions.is_empty());
    assert!(first.request.is_none());
    assert!(first.error.as_deref().unwrap().contains("undefined_id"));

    assert_eq!(run.steps[1].outcome, StepOutcome::Passed);
}

/// 测试网络错误：Step 失败但不终止 Run
#[tokio::test]
async fn test_network_error_fails_step_not_run() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/alive"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let collection = collection_from(serde_json::json!({
        "name": "network",
        "steps": [
            {
                "method": "GET",
                // 没有服务在监听的端口
                "url": "http://127.0.0.1:9/unreachable",
                "assertions": [{ "target": "status", "comparator": "equals", "expected": "200" }]
            },
            {
                "method": "GET",
                "url": "${base_url}/alive",
                "assertions": [{ "target": "status", "comparator": "equals", "expected": "200" }]
            }
        ]
    }));

    let mut store = VariableStore::new();
    store.set("base_url", mock_server.uri());

    let run = RunCoordinator::new(config()).run(&collection, &mut store).await;

    let first = &run.steps[0];
    assert_eq!(first.outcome, StepOutcome::Failed);
    assert!(first.error.is_some());
    assert!(first.response.is_none());

    assert_eq!(run.steps[1].outcome, StepOutcome::Passed);
}

/// 测试超时：慢响应在配置的超时后判为 Step 失败
#[tokio::test]
async fn test_timeout_fails_step() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&mock_server)
        .await;

    let collection = collection_from(serde_json::json!({
        "name": "timeout",
        "steps": [{
            "method": "GET",
            "url": "${base_url}/slow",
            "assertions": [{ "target": "status", "comparator": "equals", "expected": "200" }]
        }]
    }));

    let mut store = VariableStore::new();
    store.set("base_url", mock_server.uri());

    let run = RunCoordinator::new(RunConfig {
        timeout: Duration::from_millis(200),
        ..config()
    })
    .run(&collection, &mut store)
    .await;

    assert_eq!(run.steps[0].outcome, StepOutcome::Failed);
    assert!(run.steps[0].error.as_deref().unwrap().contains("timed out"));
}

/// 测试取消：已取消的 Run 把全部 Step 记为 Skipped
#[tokio::test]
async fn test_cancelled_run_skips_all_steps() {
    let collection = collection_from(serde_json::json!({
        "name": "cancelled",
        "steps": [
            { "method": "GET", "url": "http://127.0.0.1:9/a" },
            { "method": "GET", "url": "http://127.0.0.1:9/b" }
        ]
    }));

    let coordinator = RunCoordinator::new(config());
    coordinator.cancel_token().cancel();

    let mut store = VariableStore::new();
    let run = coordinator.run(&collection, &mut store).await;

    assert_eq!(run.totals.skipped, 2);
    assert_eq!(run.totals.passed, 0);
    assert_eq!(run.totals.failed, 0);
    assert_eq!(run.state, RunState::Completed);
}

/// 测试有限重试：attempts=2 时对同一请求重试一次
#[tokio::test]
async fn test_bounded_retry_eventually_succeeds() {
    let mock_server = MockServer::start().await;

    // 请求体匹配的 mock 正常响应；重试场景下两次都会命中
    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(body_string_contains("payload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let collection = collection_from(serde_json::json!({
        "name": "retry",
        "steps": [{
            "method": "POST",
            "url": "${base_url}/submit",
            "body": "{\"data\": \"payload\"}",
            "assertions": [{ "target": "status", "comparator": "equals", "expected": "200" }]
        }]
    }));

    let mut store = VariableStore::new();
    store.set("base_url", mock_server.uri());

    let run = RunCoordinator::new(RunConfig {
        attempts: 2,
        ..config()
    })
    .run(&collection, &mut store)
    .await;

    // 第一次就成功，不应发出第二次请求
    assert_eq!(run.totals.passed, 1);
}
