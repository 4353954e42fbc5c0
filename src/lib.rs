//! Core implementation of the alfred command runner
//!
//! Alfred is a personal command runner: users describe named shortcuts in
//! a JSON command list (each mapping a name to a shell script, optional
//! working directory, CLI options, and optional inheritance from another
//! shortcut), and alfred registers them as subcommands and executes the
//! matching script when invoked.
//!
//! The resolution pipeline runs once per invocation: the cache store
//! supplies raw JSON, the schema validator checks it, the inheritance
//! resolver merges `extends` chains, the registrar builds the CLI
//! surface, and the executor runs the templated script.

use log::debug;
use serde_json::Value;
use thiserror::Error;

use crate::commands::definition::CommandDefinition;
use crate::commands::inherit::{self, ResolveError};
use crate::commands::schema::{self, SchemaError};

pub mod cache;
pub mod commands;
pub mod completion;
pub mod exec;
pub mod picker;
pub mod registrar;
pub mod template;

/// Errors from the load-and-resolve pipeline
#[derive(Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl LoadError {
    /// The schema issues behind this error, when it is a user-facing
    /// validation failure rather than an internal defect
    #[must_use]
    pub fn schema_error(&self) -> Option<&SchemaError> {
        match self {
            LoadError::Schema(err) | LoadError::Resolve(ResolveError::Schema(err)) => Some(err),
            LoadError::Resolve(_) => None,
        }
    }
}

/// Validate and resolve a raw command set into typed definitions.
///
/// This is the single entry the binary and tests use: validation always
/// runs before inheritance resolution, which is what makes an unresolved
/// parent during resolution an internal invariant violation rather than
/// a user error.
///
/// # Errors
///
/// Returns `LoadError::Schema` if validation fails, or
/// `LoadError::Resolve` if inheritance resolution fails.
pub fn resolve_command_set(raw: Vec<Value>) -> Result<Vec<CommandDefinition>, LoadError> {
    schema::validate_set(&raw)?;
    let resolved = inherit::resolve_set(raw)?;
    debug!("resolved {} command definitions", resolved.len());
    Ok(resolved)
}
