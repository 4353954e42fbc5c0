//! Shell-completion candidates derived from the resolved command list
//!
//! Shell integration itself (registering the completer) is left to the
//! user's shell config; this module only emits the candidates: command
//! names with descriptions, or flag names when a command is named.

use crate::commands::definition::CommandDefinition;
use crate::registrar;

/// Completion candidates, one per line, as `value:description` pairs.
/// With `command` set, candidates are that command's flags instead of the
/// command names.
#[must_use]
pub fn candidates(definitions: &[CommandDefinition], command: Option<&str>) -> Vec<String> {
    match command.and_then(|name| definitions.iter().find(|def| def.name == name)) {
        Some(definition) => definition
            .options
            .iter()
            .filter_map(|spec| {
                let flags = registrar::parse_flags(&spec.flags);
                let long = flags.long?;
                Some(format!("--{long}:{}", spec.description))
            })
            .collect(),
        None => definitions
            .iter()
            .map(|def| format!("{}:{}", def.name, def.description))
            .collect(),
    }
}
