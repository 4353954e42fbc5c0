//! Structural validation of raw command definitions
//!
//! Definitions arrive as parsed JSON and are checked field by field before
//! any typed deserialization happens. The validator is strict: unknown
//! fields anywhere in the shape are rejected. Definitions that carry an
//! `extends` reference are checked in relaxed mode, where required fields
//! may be absent (they will be filled in by the parent during resolution)
//! but any field that is present must still conform.

use std::collections::HashSet;
use std::fmt::Write;

use serde_json::Value;
use thiserror::Error;

use crate::commands::definition::OptionType;

/// A single validation finding: where, what kind, and a readable message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Structural path to the offending field, e.g. `0.extends` or
    /// `2.options.1.type`
    pub path: String,
    pub code: &'static str,
    pub message: String,
}

impl Issue {
    fn new(path: impl Into<String>, code: &'static str, message: impl Into<String>) -> Self {
        Issue {
            path: path.into(),
            code,
            message: message.into(),
        }
    }
}

/// One or more command definitions failed validation
#[derive(Error, Debug)]
#[error("{}", format_issues(.0))]
pub struct SchemaError(pub Vec<Issue>);

fn format_issues(issues: &[Issue]) -> String {
    let mut out = format!("invalid command definitions ({} issue(s))", issues.len());
    for issue in issues {
        let _ = write!(out, "\n  [{}] {}: {}", issue.code, issue.path, issue.message);
    }
    out
}

const DEFINITION_FIELDS: [&str; 6] = [
    "name",
    "description",
    "command",
    "config",
    "extends",
    "options",
];
const SCRIPT_FIELDS: [&str; 2] = ["dir", "cmd"];
const CONFIG_FIELDS: [&str; 1] = ["confirm"];
const OPTION_FIELDS: [&str; 7] = [
    "flags",
    "description",
    "required",
    "defaultValue",
    "envVar",
    "choices",
    "type",
];

/// Validate a raw command set.
///
/// Checks every definition's shape, rejects duplicate `name`s, and checks
/// `extends` targets against the sibling `name`s of the raw, unresolved
/// list.
///
/// # Errors
///
/// Returns `SchemaError` with the full issue list if anything is wrong.
pub fn validate_set(raw: &[Value]) -> Result<(), SchemaError> {
    let mut issues = Vec::new();

    let names: Vec<Option<&str>> = raw
        .iter()
        .map(|value| value.get("name").and_then(Value::as_str))
        .collect();

    let mut seen = HashSet::new();
    for (index, name) in names.iter().enumerate() {
        if let Some(name) = name
            && !seen.insert(*name)
        {
            issues.push(Issue::new(
                format!("{index}.name"),
                "duplicate_name",
                format!("command name \"{name}\" is already defined"),
            ));
        }
    }

    for (index, value) in raw.iter().enumerate() {
        let relaxed = value.get("extends").is_some();
        validate_definition(value, &index.to_string(), relaxed, &mut issues);

        if let Some(target) = value.get("extends").and_then(Value::as_str)
            && !names.iter().flatten().any(|name| *name == target)
        {
            issues.push(Issue::new(
                format!("{index}.extends"),
                "unknown_extends",
                format!("command \"{target}\" unknown"),
            ));
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(SchemaError(issues))
    }
}

/// Validate a single definition value against the definition shape.
///
/// With `relaxed` set, required fields may be absent (the deep-partial
/// shape used for definitions that extend a parent).
pub(crate) fn validate_definition(
    value: &Value,
    path: &str,
    relaxed: bool,
    issues: &mut Vec<Issue>,
) {
    let Some(object) = value.as_object() else {
        issues.push(Issue::new(path, "invalid_type", "expected an object"));
        return;
    };

    for key in object.keys() {
        if !DEFINITION_FIELDS.contains(&key.as_str()) {
            issues.push(Issue::new(
                format!("{path}.{key}"),
                "unknown_field",
                format!("unrecognized field \"{key}\""),
            ));
        }
    }

    check_string(object.get("name"), &format!("{path}.name"), relaxed, true, issues);
    check_string(
        object.get("description"),
        &format!("{path}.description"),
        relaxed,
        false,
        issues,
    );

    match object.get("command") {
        Some(script @ Value::Object(_)) => {
            validate_script(script, &format!("{path}.command"), relaxed, issues);
        }
        Some(Value::Array(scripts)) => {
            if scripts.is_empty() {
                issues.push(Issue::new(
                    format!("{path}.command"),
                    "empty",
                    "command list must not be empty",
                ));
            }
            for (index, script) in scripts.iter().enumerate() {
                validate_script(script, &format!("{path}.command.{index}"), relaxed, issues);
            }
        }
        Some(_) => issues.push(Issue::new(
            format!("{path}.command"),
            "invalid_type",
            "expected an object or an array of objects",
        )),
        None => {
            if !relaxed {
                issues.push(Issue::new(
                    format!("{path}.command"),
                    "required",
                    "command is required",
                ));
            }
        }
    }

    if let Some(config) = object.get("config") {
        validate_config(config, &format!("{path}.config"), issues);
    }

    if let Some(extends) = object.get("extends")
        && !extends.is_string()
    {
        issues.push(Issue::new(
            format!("{path}.extends"),
            "invalid_type",
            "expected a string",
        ));
    }

    match object.get("options") {
        Some(Value::Array(options)) => {
            for (index, option) in options.iter().enumerate() {
                validate_option(option, &format!("{path}.options.{index}"), relaxed, issues);
            }
        }
        Some(_) => issues.push(Issue::new(
            format!("{path}.options"),
            "invalid_type",
            "expected an array",
        )),
        None => {}
    }
}

fn validate_script(value: &Value, path: &str, relaxed: bool, issues: &mut Vec<Issue>) {
    let Some(object) = value.as_object() else {
        issues.push(Issue::new(path, "invalid_type", "expected an object"));
        return;
    };

    for key in object.keys() {
        if !SCRIPT_FIELDS.contains(&key.as_str()) {
            issues.push(Issue::new(
                format!("{path}.{key}"),
                "unknown_field",
                format!("unrecognized field \"{key}\""),
            ));
        }
    }

    if let Some(dir) = object.get("dir")
        && !dir.is_string()
    {
        issues.push(Issue::new(
            format!("{path}.dir"),
            "invalid_type",
            "expected a string",
        ));
    }

    match object.get("cmd") {
        Some(Value::String(cmd)) => {
            if cmd.is_empty() {
                issues.push(Issue::new(
                    format!("{path}.cmd"),
                    "empty",
                    "command script is required",
                ));
            }
        }
        Some(_) => issues.push(Issue::new(
            format!("{path}.cmd"),
            "invalid_type",
            "expected a string",
        )),
        None => {
            if !relaxed {
                issues.push(Issue::new(
                    format!("{path}.cmd"),
                    "required",
                    "command script is required",
                ));
            }
        }
    }
}

fn validate_config(value: &Value, path: &str, issues: &mut Vec<Issue>) {
    let Some(object) = value.as_object() else {
        issues.push(Issue::new(path, "invalid_type", "expected an object"));
        return;
    };

    for key in object.keys() {
        if !CONFIG_FIELDS.contains(&key.as_str()) {
            issues.push(Issue::new(
                format!("{path}.{key}"),
                "unknown_field",
                format!("unrecognized field \"{key}\""),
            ));
        }
    }

    if let Some(confirm) = object.get("confirm")
        && !confirm.is_boolean()
    {
        issues.push(Issue::new(
            format!("{path}.confirm"),
            "invalid_type",
            "expected a boolean",
        ));
    }
}

fn validate_option(value: &Value, path: &str, relaxed: bool, issues: &mut Vec<Issue>) {
    let Some(object) = value.as_object() else {
        issues.push(Issue::new(path, "invalid_type", "expected an object"));
        return;
    };

    for key in object.keys() {
        if !OPTION_FIELDS.contains(&key.as_str()) {
            issues.push(Issue::new(
                format!("{path}.{key}"),
                "unknown_field",
                format!("unrecognized field \"{key}\""),
            ));
        }
    }

    check_string(object.get("flags"), &format!("{path}.flags"), relaxed, false, issues);
    check_string(
        object.get("description"),
        &format!("{path}.description"),
        relaxed,
        false,
        issues,
    );

    if let Some(required) = object.get("required")
        && !required.is_boolean()
    {
        issues.push(Issue::new(
            format!("{path}.required"),
            "invalid_type",
            "expected a boolean",
        ));
    }

    if let Some(env_var) = object.get("envVar")
        && !env_var.is_string()
    {
        issues.push(Issue::new(
            format!("{path}.envVar"),
            "invalid_type",
            "expected a string",
        ));
    }

    match object.get("choices") {
        Some(Value::Array(choices)) => {
            for (index, choice) in choices.iter().enumerate() {
                if !choice.is_string() {
                    issues.push(Issue::new(
                        format!("{path}.choices.{index}"),
                        "invalid_type",
                        "expected a string",
                    ));
                }
            }
        }
        Some(_) => issues.push(Issue::new(
            format!("{path}.choices"),
            "invalid_type",
            "expected an array of strings",
        )),
        None => {}
    }

    match object.get("type") {
        Some(Value::String(kind)) => {
            if !OptionType::NAMES.contains(&kind.as_str()) {
                issues.push(Issue::new(
                    format!("{path}.type"),
                    "invalid_enum",
                    format!(
                        "\"{kind}\" is not one of: {}",
                        OptionType::NAMES.join(", ")
                    ),
                ));
            }
        }
        Some(_) => issues.push(Issue::new(
            format!("{path}.type"),
            "invalid_type",
            "expected a string",
        )),
        None => {}
    }
}

/// Shared string-field check. `must_be_non_empty` additionally rejects `""`.
fn check_string(
    value: Option<&Value>,
    path: &str,
    relaxed: bool,
    must_be_non_empty: bool,
    issues: &mut Vec<Issue>,
) {
    match value {
        Some(Value::String(s)) => {
            if must_be_non_empty && s.is_empty() {
                issues.push(Issue::new(path, "empty", "value must not be empty"));
            }
        }
        Some(_) => issues.push(Issue::new(path, "invalid_type", "expected a string")),
        None => {
            if !relaxed {
                issues.push(Issue::new(path, "required", "field is required"));
            }
        }
    }
}
