use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single named shortcut: a shell script (or several), its options, and
/// optional inheritance from another definition
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CommandDefinition {
    pub name: String,
    pub description: String,
    pub command: Scripts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<RunConfig>,
    /// Name of the parent definition. Resolved once at load time; kept
    /// afterwards only for display.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    #[serde(default)]
    pub options: Vec<OptionSpec>,
}

impl CommandDefinition {
    #[must_use]
    pub fn needs_confirmation(&self) -> bool {
        self.config
            .as_ref()
            .and_then(|c| c.confirm)
            .unwrap_or(false)
    }
}

/// One shell script with an optional working directory (may start with `~`)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    pub cmd: String,
}

/// A definition's script list: a single script or several, which run
/// concurrently
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Scripts {
    One(Script),
    Many(Vec<Script>),
}

impl Scripts {
    #[must_use]
    pub fn as_slice(&self) -> &[Script] {
        match self {
            Scripts::One(script) => std::slice::from_ref(script),
            Scripts::Many(scripts) => scripts,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Require interactive confirmation before running
    pub confirm: Option<bool>,
}

/// A CLI option attached to a definition, in commander-style flag notation
/// (e.g. `-n, --name <name>`). Order matters: flags are registered in the
/// order they appear, which drives help text.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct OptionSpec {
    pub flags: String,
    pub description: String,
    pub required: Option<bool>,
    pub default_value: Option<Value>,
    pub env_var: Option<String>,
    pub choices: Option<Vec<String>>,
    #[serde(rename = "type")]
    pub kind: Option<OptionType>,
}

/// Closed set of typed option parsers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Number,
    String,
    Boolean,
    Url,
    Path,
}

impl OptionType {
    pub const NAMES: [&'static str; 5] = ["number", "string", "boolean", "url", "path"];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            OptionType::Number => "number",
            OptionType::String => "string",
            OptionType::Boolean => "boolean",
            OptionType::Url => "url",
            OptionType::Path => "path",
        }
    }
}
