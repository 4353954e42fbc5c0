//! Dynamic CLI surface built from resolved command definitions
//!
//! Each [`CommandDefinition`] becomes a clap subcommand; each of its
//! [`OptionSpec`]s becomes a typed `clap::Arg`. Flag strings use the
//! conventional `-s, --long <value>` notation: a `<value>`/`[value]`
//! placeholder means the option takes a value, otherwise it registers as
//! a boolean switch. Unsupported option types are a configuration defect
//! and fail at registration time, not at invocation.

use std::collections::HashMap;
use std::fmt;

use clap::builder::{PossibleValuesParser, ValueParser};
use clap::{Arg, ArgAction, ArgMatches, Command};
use log::debug;
use thiserror::Error;
use url::Url;

use crate::commands::definition::{CommandDefinition, OptionSpec, OptionType};

#[derive(Error, Debug)]
pub enum RegistrarError {
    #[error("option \"{flags}\" on command \"{command}\" has unsupported type \"{kind}\"")]
    UnsupportedType {
        command: String,
        flags: String,
        kind: &'static str,
    },
    #[error("option \"{flags}\" on command \"{command}\" has no usable flag name")]
    InvalidFlags { command: String, flags: String },
    #[error(
        "switch \"{flags}\" on command \"{command}\" takes no value and cannot use required, defaultValue, envVar, or choices"
    )]
    SwitchWithValueModifiers { command: String, flags: String },
}

/// A parsed, typed option value supplied at invocation time
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Number(f64),
    String(String),
    Boolean(bool),
    Url(Url),
}

/// Largest integer `f64` represents exactly (2^53); beyond it the cast
/// to `i64` would saturate or lose digits
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Whole numbers within the exact range template without a
            // decimal point; larger ones keep the float form
            #[allow(clippy::cast_possible_truncation)]
            OptionValue::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_EXACT_INT => {
                write!(f, "{}", *n as i64)
            }
            OptionValue::Number(n) => write!(f, "{n}"),
            OptionValue::String(s) => write!(f, "{s}"),
            OptionValue::Boolean(b) => write!(f, "{b}"),
            OptionValue::Url(u) => write!(f, "{u}"),
        }
    }
}

/// A flag string split into its parts, e.g. `-n, --name <name>`
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct FlagSpec {
    pub short: Option<char>,
    pub long: Option<String>,
    pub takes_value: bool,
}

impl FlagSpec {
    /// The option's identity: the long name when present, short otherwise.
    /// Also the key the templater matches `${name}` tokens against.
    pub fn name(&self) -> Option<String> {
        self.long
            .clone()
            .or_else(|| self.short.map(|c| c.to_string()))
    }
}

pub(crate) fn parse_flags(flags: &str) -> FlagSpec {
    let mut spec = FlagSpec::default();
    for token in flags.split([' ', ',']).filter(|t| !t.is_empty()) {
        if let Some(long) = token.strip_prefix("--") {
            spec.long = Some(long.to_string());
        } else if let Some(short) = token.strip_prefix('-') {
            spec.short = short.chars().next();
        } else if token.starts_with('<') || token.starts_with('[') {
            spec.takes_value = true;
        }
    }
    spec
}

/// Register every definition as a subcommand on `root`.
///
/// # Errors
///
/// Returns `RegistrarError` if an option has an unsupported type or an
/// unusable flag string.
pub fn register(
    mut root: Command,
    definitions: &[CommandDefinition],
) -> Result<Command, RegistrarError> {
    for definition in definitions {
        root = root.subcommand(build_command(definition)?);
    }
    Ok(root)
}

/// Build the subcommand for a single definition.
///
/// # Errors
///
/// Returns `RegistrarError` if an option cannot be registered.
pub fn build_command(definition: &CommandDefinition) -> Result<Command, RegistrarError> {
    debug!("registering subcommand \"{}\"", definition.name);
    let mut command = Command::new(definition.name.clone()).about(definition.description.clone());
    for spec in &definition.options {
        command = command.arg(build_arg(&definition.name, spec)?);
    }
    Ok(command)
}

fn build_arg(command_name: &str, spec: &OptionSpec) -> Result<Arg, RegistrarError> {
    let flags = parse_flags(&spec.flags);
    let name = flags.name().ok_or_else(|| RegistrarError::InvalidFlags {
        command: command_name.to_string(),
        flags: spec.flags.clone(),
    })?;

    let mut arg = Arg::new(name).help(spec.description.clone());
    if let Some(short) = flags.short {
        arg = arg.short(short);
    }
    if let Some(long) = &flags.long {
        arg = arg.long(long.clone());
    }

    if !flags.takes_value {
        // Bare switch: present means true, no value accepted. Value
        // modifiers on a switch are a configuration defect, not a flag
        // clap should quietly drop.
        if spec.required.unwrap_or(false)
            || spec.default_value.is_some()
            || spec.env_var.is_some()
            || spec.choices.is_some()
        {
            return Err(RegistrarError::SwitchWithValueModifiers {
                command: command_name.to_string(),
                flags: spec.flags.clone(),
            });
        }
        return Ok(arg.action(ArgAction::SetTrue));
    }

    arg = arg.value_parser(value_parser_for(command_name, spec)?);
    // A default satisfies the requirement, and clap rejects the
    // combination outright
    arg = arg.required(spec.required.unwrap_or(false) && spec.default_value.is_none());

    if let Some(default) = &spec.default_value {
        let default = default_as_string(default);
        // The default doubles as the preset used when the flag is given
        // with no value
        arg = arg
            .num_args(0..=1)
            .default_value(default.clone())
            .default_missing_value(default);
    }
    if let Some(env_var) = &spec.env_var {
        arg = arg.env(env_var.clone());
    }

    Ok(arg)
}

fn default_as_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn value_parser_for(command_name: &str, spec: &OptionSpec) -> Result<ValueParser, RegistrarError> {
    if let Some(choices) = &spec.choices {
        return Ok(PossibleValuesParser::new(choices.clone()).into());
    }
    match spec.kind.unwrap_or(OptionType::String) {
        OptionType::Number => Ok(ValueParser::new(|raw: &str| {
            raw.parse::<f64>()
                .map(OptionValue::Number)
                .map_err(|e| format!("not a number: {e}"))
        })),
        OptionType::String => Ok(ValueParser::new(|raw: &str| {
            Ok::<_, String>(OptionValue::String(raw.to_string()))
        })),
        OptionType::Boolean => Ok(ValueParser::new(|raw: &str| {
            Ok::<_, String>(OptionValue::Boolean(raw.eq_ignore_ascii_case("true")))
        })),
        OptionType::Url => Ok(ValueParser::new(|raw: &str| {
            Url::parse(raw)
                .map(OptionValue::Url)
                .map_err(|e| format!("not a valid absolute URL: {e}"))
        })),
        kind @ OptionType::Path => Err(RegistrarError::UnsupportedType {
            command: command_name.to_string(),
            flags: spec.flags.clone(),
            kind: kind.name(),
        }),
    }
}

/// Collect the supplied option values for one invocation, keyed by option
/// name. Options that were not provided (and have no default or env
/// source) are absent from the map; unset switches are absent rather than
/// `false`, so their `${tokens}` are removed by the templater.
#[must_use]
pub fn collect_values(
    definition: &CommandDefinition,
    matches: &ArgMatches,
) -> HashMap<String, OptionValue> {
    let mut values = HashMap::new();
    for spec in &definition.options {
        let flags = parse_flags(&spec.flags);
        let Some(name) = flags.name() else {
            continue;
        };
        if !flags.takes_value {
            if matches.get_flag(&name) {
                values.insert(name, OptionValue::Boolean(true));
            }
        } else if spec.choices.is_some() {
            if let Some(choice) = matches.get_one::<String>(&name) {
                values.insert(name, OptionValue::String(choice.clone()));
            }
        } else if let Some(value) = matches.get_one::<OptionValue>(&name) {
            values.insert(name, value.clone());
        }
    }
    values
}
