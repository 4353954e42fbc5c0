//! Interactive command selection for zero-argument invocations

use std::fmt;

use inquire::{InquireError, Select};

use crate::commands::definition::CommandDefinition;

struct PickEntry {
    name: String,
    label: String,
}

impl fmt::Display for PickEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// Present a filterable list of `name (description)` pairs and return the
/// chosen command name; `None` when the user backs out. Filtering is a
/// case-sensitive substring match against the command name.
///
/// # Errors
///
/// Returns `InquireError` if the terminal interaction fails.
pub fn pick(definitions: &[CommandDefinition]) -> Result<Option<String>, InquireError> {
    let entries: Vec<PickEntry> = definitions
        .iter()
        .map(|def| PickEntry {
            name: def.name.clone(),
            label: format!("{} ({})", def.name, def.description),
        })
        .collect();

    let chosen = Select::new("Select a command", entries)
        .with_scorer(&|input, entry, _, _| {
            if entry.name.contains(input) {
                Some(0)
            } else {
                None
            }
        })
        .prompt_skippable()?;

    Ok(chosen.map(|entry| entry.name))
}
