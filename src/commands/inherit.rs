//! `extends` resolution for command definitions
//!
//! A definition naming a parent through `extends` is merged onto that
//! parent: the parent's fields form the base and the child's own fields
//! win. Before merging, every literal `{super}` token in the child's
//! script is replaced with the parent's script, one substitution level
//! deep. The merged value is re-validated against the strict shape and
//! only then deserialized into a typed [`CommandDefinition`].

use log::debug;
use serde_json::Value;
use thiserror::Error;

use crate::commands::definition::CommandDefinition;
use crate::commands::schema::{self, SchemaError};

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// An `extends` target vanished between validation and resolution.
    /// Unreachable when the validator ran first; a defect, not user input.
    #[error("illegal state: parent command \"{0}\" not found during resolution")]
    UnresolvedParent(String),
    #[error("unable to deserialize resolved command definition: {0}")]
    Deserialize(#[from] serde_json::Error),
}

/// Resolve a validated raw set into typed definitions.
///
/// Definitions without `extends` pass through unchanged. Parent lookup
/// happens against the raw, unmerged list, so a child extending another
/// child sees its parent's original fields, not the merged ones.
///
/// # Errors
///
/// Returns `ResolveError::UnresolvedParent` if a parent is missing,
/// `ResolveError::Schema` if a merge produced an invalid shape, or
/// `ResolveError::Deserialize` if typed conversion fails.
pub fn resolve_set(raw: Vec<Value>) -> Result<Vec<CommandDefinition>, ResolveError> {
    let originals = raw.clone();
    let mut resolved = Vec::with_capacity(raw.len());

    for (index, mut value) in raw.into_iter().enumerate() {
        if let Some(target) = value.get("extends").and_then(Value::as_str) {
            let target = target.to_string();
            let parent = originals
                .iter()
                .find(|candidate| candidate.get("name").and_then(Value::as_str) == Some(&target))
                .ok_or_else(|| ResolveError::UnresolvedParent(target.clone()))?;
            debug!("merging command at index {index} onto parent \"{target}\"");

            substitute_super(&mut value, parent);
            value = deep_merge(parent.clone(), value);

            let mut issues = Vec::new();
            schema::validate_definition(&value, &index.to_string(), false, &mut issues);
            if !issues.is_empty() {
                return Err(SchemaError(issues).into());
            }
        }
        resolved.push(serde_json::from_value(value)?);
    }

    Ok(resolved)
}

/// Replace every literal `{super}` in the child's script(s) with the
/// parent's script, as-is. Only the direct parent is substituted; tokens
/// inside the parent's own script are never expanded further.
fn substitute_super(child: &mut Value, parent: &Value) {
    let Some(parent_cmd) = parent
        .get("command")
        .and_then(|c| c.get("cmd"))
        .and_then(Value::as_str)
    else {
        return;
    };
    let parent_cmd = parent_cmd.to_string();

    let Some(command) = child.get_mut("command") else {
        return;
    };
    match command {
        Value::Object(_) => substitute_in_script(command, &parent_cmd),
        Value::Array(scripts) => {
            for script in scripts {
                substitute_in_script(script, &parent_cmd);
            }
        }
        _ => {}
    }
}

fn substitute_in_script(script: &mut Value, parent_cmd: &str) {
    if let Some(cmd) = script.get_mut("cmd")
        && let Some(text) = cmd.as_str()
    {
        *cmd = Value::String(text.replace("{super}", parent_cmd));
    }
}

/// Right-wins recursive merge over JSON trees. Objects merge key by key
/// with the overlay winning on conflicts; arrays and scalars are replaced
/// wholesale by the overlay.
#[must_use]
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                let merged = match base.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                base.insert(key, merged);
            }
            Value::Object(base)
        }
        (_, overlay) => overlay,
    }
}
