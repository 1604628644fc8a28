use postrun::PostrunError;
use postrun::collection::{self, Environment, Source};
use postrun::http::Method;
use postrun::variable::Value;
use std::fs;
use tempfile::TempDir;

/// 测试从文件加载合法集合
#[test]
fn test_load_collection_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("smoke.json");

    let content = r#"{
        "name": "hotel-smoke",
        "steps": [
            {
                "name": "create booking",
                "method": "POST",
                "url": "${base_url}/booking",
                "headers": { "Content-Type": "application/json" },
                "body": "{\"firstname\": \"Jim\"}",
                "assertions": [
                    { "target": "status", "comparator": "equals", "expected": "200" },
                    { "target": "body.bookingid", "comparator": "exists" }
                ],
                "extractions": [
                    { "source": "body.bookingid", "name": "booking_id" }
                ]
            }
        ]
    }"#;

    fs::write(&file, content).unwrap();

    let collection = collection::load_file(&file).unwrap();
    assert_eq!(collection.name, "hotel-smoke");
    assert_eq!(collection.steps.len(), 1);
    assert_eq!(collection.steps[0].method, Method::Post);
    assert_eq!(
        collection.steps[0].extractions[0].source,
        Source::Body(vec!["bookingid".to_string()])
    );
}

/// 测试缺失文件：IO 错误（运维错误，不是集合无效）
#[test]
fn test_load_missing_file_is_io_error() {
    let err = collection::load_file("/nonexistent/collection.json").unwrap_err();
    assert!(matches!(err, PostrunError::IoError(_)));
}

/// 测试结构校验一次报出所有错误
#[test]
fn test_invalid_collection_lists_every_error() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("broken.json");

    let content = r#"{
        "name": "",
        "steps": [
            { "method": "FETCH", "url": "" },
            {
                "method": "GET",
                "url": "http://example.com",
                "assertions": [
                    { "target": "status", "comparator": "almost", "expected": "200" }
                ]
            }
        ]
    }"#;

    fs::write(&file, content).unwrap();

    let err = collection::load_file(&file).unwrap_err();
    let errors = match err {
        PostrunError::InvalidCollection { errors, .. } => errors,
        other => panic!("unexpected error: {}", other),
    };

    assert!(errors.iter().any(|e| e.contains("name: must not be empty")));
    assert!(errors.iter().any(|e| e.contains("steps[0].method")));
    assert!(errors.iter().any(|e| e.contains("steps[0].url")));
    assert!(errors.iter().any(|e| e.contains("steps[1].assertions[0].comparator")));
    assert!(errors.len() >= 4);
}

/// 测试环境文件加载和 CLI 覆盖
#[test]
fn test_environment_seeds_store() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("staging.toml");

    let content = r#"
name = "staging"

[variables]
base_url = "https://staging.example.com"
api_key = "staging-key"
max_items = 20
"#;

    fs::write(&file, content).unwrap();

    let environment = Environment::load_from_path(&file).unwrap();
    let overrides = vec![("api_key".to_string(), "override-key".to_string())];
    let store = environment.seed_store(&overrides);

    assert_eq!(
        store.get("base_url"),
        Some(&Value::String("https://staging.example.com".to_string()))
    );
    assert_eq!(store.get("api_key"), Some(&Value::String("override-key".to_string())));
    assert_eq!(store.get("max_items"), Some(&Value::Number(20.0)));
}
