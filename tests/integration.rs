use std::collections::HashMap;

use serde_json::{Value, json};

use alfred::cache::{self, CachePaths};
use alfred::exec::{self, ExecConfig};
use alfred::registrar::{self, OptionValue};
use alfred::{LoadError, completion, resolve_command_set, template};

fn write_commands(dir: &std::path::Path, content: &Value) -> CachePaths {
    let paths = CachePaths::in_dir(dir);
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(&paths.commands, serde_json::to_string_pretty(content).unwrap()).unwrap();
    paths
}

#[test]
fn test_load_and_resolve_from_cache() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_commands(
        dir.path(),
        &json!([
            {
                "name": "build",
                "description": "Build the project",
                "command": {"cmd": "cargo build"}
            },
            {
                "name": "rebuild",
                "extends": "build",
                "description": "Clean build",
                "command": {"cmd": "cargo clean && {super}"}
            }
        ]),
    );

    let raw = cache::load_raw_commands(&paths).unwrap();
    let definitions = resolve_command_set(raw).unwrap();
    assert_eq!(definitions.len(), 2);
    assert_eq!(
        definitions[1].command.as_slice()[0].cmd,
        "cargo clean && cargo build"
    );
}

#[test]
fn test_resolution_identity_without_extends() {
    let raw = vec![
        json!({
            "name": "one",
            "description": "First",
            "command": {"cmd": "echo one"}
        }),
        json!({
            "name": "two",
            "description": "Second",
            "command": {"dir": "~", "cmd": "echo two"}
        }),
    ];
    let definitions = resolve_command_set(raw.clone()).unwrap();
    for (definition, original) in definitions.iter().zip(&raw) {
        assert_eq!(serde_json::to_value(definition).unwrap()["name"], original["name"]);
        assert_eq!(
            serde_json::to_value(definition).unwrap()["command"],
            original["command"]
        );
    }
}

#[test]
fn test_schema_failure_carries_index_and_field_path() {
    let raw = vec![
        json!({
            "name": "ok",
            "description": "Fine",
            "command": {"cmd": "echo ok"}
        }),
        json!({"name": "broken", "extends": "nope"}),
    ];
    let err = resolve_command_set(raw).unwrap_err();
    let schema_err = match &err {
        LoadError::Schema(schema_err) => schema_err,
        other => panic!("Expected schema error, got: {other:?}"),
    };
    let issue = schema_err
        .0
        .iter()
        .find(|i| i.code == "unknown_extends")
        .expect("missing unknown_extends issue");
    assert_eq!(issue.path, "1.extends");
    assert!(issue.message.contains("nope"));
}

#[test]
fn test_duplicate_names_are_rejected() {
    // Policy: duplicates are an explicit validation failure, not
    // last-definition-wins registration.
    let raw = vec![
        json!({"name": "dup", "description": "a", "command": {"cmd": "echo a"}}),
        json!({"name": "dup", "description": "b", "command": {"cmd": "echo b"}}),
    ];
    let err = resolve_command_set(raw).unwrap_err();
    let schema_err = err.schema_error().expect("expected schema error");
    assert!(schema_err.0.iter().any(|i| i.code == "duplicate_name"));
}

#[test]
fn test_registrar_surface_end_to_end() {
    let definitions = resolve_command_set(vec![json!({
        "name": "deploy",
        "description": "Deploy somewhere",
        "command": {"cmd": "echo deploying to ${target} x${count}"},
        "options": [
            {"flags": "-t, --target <target>", "description": "Target env",
             "choices": ["staging", "prod"], "required": true},
            {"flags": "-c, --count <count>", "description": "Instance count",
             "type": "number", "defaultValue": 1}
        ]
    })])
    .unwrap();

    let root = registrar::register(clap::Command::new("alfred"), &definitions).unwrap();
    let matches = root
        .try_get_matches_from(["alfred", "deploy", "--target", "staging"])
        .unwrap();
    let (name, sub) = matches.subcommand().unwrap();
    assert_eq!(name, "deploy");

    let values = registrar::collect_values(&definitions[0], sub);
    assert_eq!(
        values.get("target"),
        Some(&OptionValue::String("staging".to_string()))
    );
    assert_eq!(values.get("count"), Some(&OptionValue::Number(1.0)));

    let filled = template::fill(&definitions[0].command.as_slice()[0].cmd, &values);
    assert_eq!(filled, "echo deploying to staging x1");
}

#[test]
fn test_templating_removes_unsupplied_tokens() {
    let values: HashMap<String, OptionValue> = HashMap::new();
    assert_eq!(template::fill("echo hi ${name}", &values), "echo hi");
    assert_eq!(template::fill("echo plain", &values), "echo plain");
}

#[tokio::test]
async fn test_execute_resolved_definition() {
    let definitions = resolve_command_set(vec![json!({
        "name": "greet",
        "description": "Greet",
        "command": {"cmd": "echo hi ${name}"},
        "options": [
            {"flags": "-n, --name <name>", "description": "Name", "type": "string"}
        ]
    })])
    .unwrap();

    let mut values = HashMap::new();
    values.insert("name".to_string(), OptionValue::String("world".to_string()));

    let outcomes = exec::run_all(
        &definitions[0].command,
        &values,
        &ExecConfig::default(),
    )
    .await;
    assert_eq!(outcomes.len(), 1);
    let outcome = outcomes.into_iter().next().unwrap().unwrap();
    assert!(outcome.success());
    assert_eq!(outcome.stdout.trim(), "hi world");
}

#[tokio::test]
async fn test_concurrent_scripts_no_short_circuit() {
    let definitions = resolve_command_set(vec![json!({
        "name": "multi",
        "description": "Several scripts",
        "command": [
            {"cmd": "exit 3"},
            {"cmd": "echo survived"}
        ]
    })])
    .unwrap();

    let outcomes = exec::run_all(
        &definitions[0].command,
        &HashMap::new(),
        &ExecConfig::default(),
    )
    .await;
    let outcomes: Vec<_> = outcomes.into_iter().map(Result::unwrap).collect();
    assert_eq!(outcomes[0].exit_code, Some(3));
    assert!(outcomes[0].failure_summary().contains("Exit code: 3"));
    assert!(outcomes[1].success());
    assert!(outcomes[1].stdout.contains("survived"));
}

#[test]
fn test_completion_candidates_from_resolved_set() {
    let definitions = resolve_command_set(vec![
        json!({
            "name": "build",
            "description": "Build the project",
            "command": {"cmd": "cargo build"}
        }),
        json!({
            "name": "greet",
            "description": "Greet someone",
            "command": {"cmd": "echo hi ${name}"},
            "options": [
                {"flags": "-n, --name <name>", "description": "Name to greet"}
            ]
        }),
    ])
    .unwrap();

    let names = completion::candidates(&definitions, None);
    assert_eq!(names, vec!["build:Build the project", "greet:Greet someone"]);

    let flags = completion::candidates(&definitions, Some("greet"));
    assert_eq!(flags, vec!["--name:Name to greet"]);
}

#[test]
fn test_cache_init_seeds_resolvable_examples() {
    let dir = tempfile::tempdir().unwrap();
    let paths = CachePaths::in_dir(dir.path());
    cache::init_cache_files(&paths).unwrap();

    let raw = cache::load_raw_commands(&paths).unwrap();
    let definitions = resolve_command_set(raw).unwrap();
    assert!(definitions.iter().any(|def| def.extends.is_some()));

    // Settings default to an empty object
    let settings = cache::load_settings(&paths).unwrap();
    assert!(settings.shell.is_none());
}

#[test]
fn test_malformed_cache_json_is_a_cache_error() {
    let dir = tempfile::tempdir().unwrap();
    let paths = CachePaths::in_dir(dir.path());
    std::fs::create_dir_all(dir.path()).unwrap();
    std::fs::write(&paths.commands, "not json").unwrap();

    let result = cache::load_raw_commands(&paths);
    assert!(matches!(result, Err(cache::CacheError::Json { .. })));
}
