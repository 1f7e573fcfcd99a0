//! Configuration-driven chain integration tests.
//!
//! These tests load `[chains]` declarations from TOML and JSON files, compose
//! them against a registry of named layers, and run the resulting stack.

use std::io::Write;
use std::sync::{Arc, Mutex};

use stratum::prelude::*;

type Journal = Arc<Mutex<Vec<&'static str>>>;

/// Creates a registry whose layers record their names on the way in.
fn registry() -> Registry<Journal, usize> {
    let mut registry = Registry::new();
    for name in ["request_log", "auth", "timing"] {
        registry.register(
            name,
            FnMiddleware::new(name, move |journal: Journal, next: Next<Journal, usize>| {
                journal.lock().unwrap().push(name);
                async move { next.run().await.map(Some) }
            }),
        );
    }
    registry.register_terminal("count", |journal: Journal| async move {
        let seen = journal.lock().unwrap().len();
        anyhow::Ok(seen)
    });
    registry
}

fn write_config(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

async fn count(journal: Journal) -> anyhow::Result<usize> {
    let seen = journal.lock().unwrap().len();
    Ok(seen)
}

#[tokio::test]
async fn test_chains_from_toml_file() {
    let file = write_config(
        ".toml",
        r#"
[dispatch]
mode = "strict"

[chains]
api = ["request_log", "auth", "timing"]
jobs = ["timing"]
"#,
    );

    let stack = Stack::load(ConfigLoader::new().with_file(file.path()).unwrap(), &registry())
        .unwrap();
    assert_eq!(stack.names(), vec!["api", "jobs"]);
    assert_eq!(stack.mode(), Mode::Strict);

    let journal = Journal::default();
    let seen = stack.call("api", journal.clone(), count).unwrap().await.unwrap();
    assert_eq!(seen, 3);
    assert_eq!(*journal.lock().unwrap(), vec!["request_log", "auth", "timing"]);
}

#[tokio::test]
async fn test_chains_from_json_file_in_fast_mode() {
    let file = write_config(
        ".json",
        r#"{"dispatch": {"mode": "fast"}, "chains": {"api": ["auth", "request_log"]}}"#,
    );

    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
    let stack = Stack::from_config(&config, &registry()).unwrap();
    assert_eq!(stack.chain("api").map(Dispatcher::mode), Some(Mode::Fast));

    let journal = Journal::default();
    stack.call("api", journal.clone(), count).unwrap().await.unwrap();
    assert_eq!(*journal.lock().unwrap(), vec!["auth", "request_log"]);
}

#[tokio::test]
async fn test_named_terminal_from_registry() {
    let registry = registry();
    let config = StratumConfig::builder().chain("api", ["auth"]).build();
    let stack = Stack::from_config(&config, &registry).unwrap();
    let api = stack.chain("api").unwrap();

    let seen = api
        .call_named(Journal::default(), &registry, "count")
        .unwrap()
        .await
        .unwrap();
    assert_eq!(seen, 1);

    let err = api
        .call_named(Journal::default(), &registry, "render")
        .err()
        .unwrap();
    assert_eq!(err, DispatchError::missing_terminal("render"));
}

#[test]
fn test_malformed_declarations_are_reported_per_kind() {
    let cases = [
        (r#"api = "auth""#, ComposeError::not_a_sequence("string")),
        ("api = [1, 2, 3]", ComposeError::not_callable(0, "integer")),
        (
            r#"api = ["auth", ["timing"]]"#,
            ComposeError::not_callable(1, "array"),
        ),
        (
            r#"api = ["auth", "cors"]"#,
            ComposeError::unknown_middleware(1, "cors"),
        ),
    ];

    for mode in [Mode::Strict, Mode::Fast] {
        for (chains, expected) in &cases {
            let content = format!("[dispatch]\nmode = \"{mode}\"\n\n[chains]\n{chains}\n");
            let config = ConfigLoader::new()
                .with_string(&content, "toml")
                .unwrap()
                .load()
                .unwrap();

            match Stack::from_config(&config, &registry()) {
                Err(StackError::Compose { chain, source }) => {
                    assert_eq!(chain, "api");
                    assert_eq!(&source, expected, "mode {mode}");
                }
                other => panic!("expected compose error, got {other:?}"),
            }
        }
    }
}

#[test]
fn test_unknown_config_field_is_rejected() {
    let file = write_config(".toml", "[dispatch]\nmode = \"strict\"\nretries = 3\n");
    let result = ConfigLoader::new().with_file(file.path());
    assert!(result.is_err());
}
