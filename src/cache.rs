//! Per-user cache store for the command list and settings
//!
//! Commands live in `commands.json` and executor settings in
//! `settings.json`, both under the user's cache directory. The core
//! resolution pipeline never touches the filesystem itself; it consumes
//! the raw values this module loads.

use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::exec::ExecConfig;

/// Seed content for a fresh cache
const EXAMPLE_COMMANDS: &str = include_str!("../assets/example.commands.json");

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("unable to determine the user cache directory")]
    NoCacheDir,
    #[error("no command cache found at {0} (run with --init to create one)")]
    NotInitialized(PathBuf),
    #[error("unable to access cache file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to parse cache file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("prompt failed: {0}")]
    Prompt(#[from] inquire::InquireError),
}

/// Locations of the per-user cache files
#[derive(Debug, Clone)]
pub struct CachePaths {
    pub commands: PathBuf,
    pub settings: PathBuf,
}

impl CachePaths {
    /// Resolve the cache file locations for the current user.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::NoCacheDir` if the platform cache directory
    /// cannot be determined.
    pub fn resolve() -> Result<Self, CacheError> {
        let base = dirs::cache_dir()
            .ok_or(CacheError::NoCacheDir)?
            .join(env!("CARGO_PKG_NAME"));
        Ok(Self::in_dir(&base))
    }

    /// Cache paths rooted at an explicit directory
    #[must_use]
    pub fn in_dir(base: &Path) -> Self {
        CachePaths {
            commands: base.join("commands.json"),
            settings: base.join("settings.json"),
        }
    }
}

/// User-tunable executor settings, stored next to the command list
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub shell: Option<String>,
    pub verbose: Option<bool>,
}

impl From<&Settings> for ExecConfig {
    fn from(settings: &Settings) -> Self {
        let defaults = ExecConfig::default();
        ExecConfig {
            shell: settings.shell.clone().unwrap_or(defaults.shell),
            verbose: settings.verbose.unwrap_or(defaults.verbose),
        }
    }
}

/// Create the cache directory and seed any missing files: the bundled
/// example commands and an empty settings object.
///
/// # Errors
///
/// Returns `CacheError::Io` on filesystem failure.
pub fn init_cache_files(paths: &CachePaths) -> Result<(), CacheError> {
    if let Some(base) = paths.commands.parent() {
        std::fs::create_dir_all(base).map_err(|e| CacheError::Io {
            path: base.to_path_buf(),
            source: e,
        })?;
    }
    if !paths.commands.exists() {
        debug!("seeding example commands at {}", paths.commands.display());
        write_file(&paths.commands, EXAMPLE_COMMANDS)?;
    }
    if !paths.settings.exists() {
        write_file(&paths.settings, "{}")?;
    }
    Ok(())
}

fn write_file(path: &Path, contents: &str) -> Result<(), CacheError> {
    std::fs::write(path, contents).map_err(|e| CacheError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Remove both cache files, ignoring ones that are already gone.
///
/// # Errors
///
/// Returns `CacheError::Io` on any other filesystem failure.
pub fn clear(paths: &CachePaths) -> Result<(), CacheError> {
    for path in [&paths.commands, &paths.settings] {
        match std::fs::remove_file(path) {
            Ok(()) => info!("removed {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(CacheError::Io {
                    path: path.clone(),
                    source: e,
                });
            }
        }
    }
    Ok(())
}

/// Load the raw command list as unvalidated JSON values.
///
/// # Errors
///
/// Returns `CacheError::NotInitialized` if the commands file is missing,
/// `CacheError::Io`/`CacheError::Json` on read or parse failure.
pub fn load_raw_commands(paths: &CachePaths) -> Result<Vec<Value>, CacheError> {
    let contents = match std::fs::read_to_string(&paths.commands) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CacheError::NotInitialized(paths.commands.clone()));
        }
        Err(e) => {
            return Err(CacheError::Io {
                path: paths.commands.clone(),
                source: e,
            });
        }
    };
    serde_json::from_str(&contents).map_err(|e| CacheError::Json {
        path: paths.commands.clone(),
        source: e,
    })
}

/// Load settings; a missing file means defaults.
///
/// # Errors
///
/// Returns `CacheError::Io`/`CacheError::Json` on read or parse failure.
pub fn load_settings(paths: &CachePaths) -> Result<Settings, CacheError> {
    let contents = match std::fs::read_to_string(&paths.settings) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(Settings::default());
        }
        Err(e) => {
            return Err(CacheError::Io {
                path: paths.settings.clone(),
                source: e,
            });
        }
    };
    serde_json::from_str(&contents).map_err(|e| CacheError::Json {
        path: paths.settings.clone(),
        source: e,
    })
}

/// Offer to seed a fresh cache with the example commands. Returns whether
/// a usable cache exists afterwards.
///
/// # Errors
///
/// Returns `CacheError::Prompt` if the confirmation prompt fails, or
/// `CacheError::Io` if seeding fails.
pub fn interactive_init(paths: &CachePaths) -> Result<bool, CacheError> {
    if paths.commands.exists() {
        println!("Local cache found, no need to initialize.");
        return Ok(true);
    }
    let seed = inquire::Confirm::new(
        "No local cache found. Do you want to initialize it with example commands?",
    )
    .with_default(true)
    .prompt()?;
    if seed {
        init_cache_files(paths)?;
        println!("Local cache initialized with example commands.");
        println!("You can find the commands file at: {}", paths.commands.display());
        Ok(true)
    } else {
        println!("Local cache initialization canceled.");
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_seeds_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = CachePaths::in_dir(dir.path());

        init_cache_files(&paths).unwrap();
        assert!(paths.commands.exists());
        assert!(paths.settings.exists());

        // Seeded commands must pass the full resolution pipeline
        let raw = load_raw_commands(&paths).unwrap();
        assert!(!raw.is_empty());
        crate::resolve_command_set(raw).unwrap();
    }

    #[test]
    fn test_init_preserves_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = CachePaths::in_dir(dir.path());
        std::fs::create_dir_all(dir.path()).unwrap();
        std::fs::write(&paths.commands, "[]").unwrap();

        init_cache_files(&paths).unwrap();
        assert_eq!(std::fs::read_to_string(&paths.commands).unwrap(), "[]");
    }

    #[test]
    fn test_missing_commands_file_is_not_initialized() {
        let dir = tempfile::tempdir().unwrap();
        let paths = CachePaths::in_dir(dir.path());
        let result = load_raw_commands(&paths);
        assert!(matches!(result, Err(CacheError::NotInitialized(_))));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let paths = CachePaths::in_dir(dir.path());
        init_cache_files(&paths).unwrap();

        clear(&paths).unwrap();
        assert!(!paths.commands.exists());
        clear(&paths).unwrap();
    }

    #[test]
    fn test_missing_settings_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let paths = CachePaths::in_dir(dir.path());
        let settings = load_settings(&paths).unwrap();
        assert!(settings.shell.is_none());

        let config = ExecConfig::from(&settings);
        assert_eq!(config.shell, "bash");
        assert!(!config.verbose);
    }

    #[test]
    fn test_settings_override_exec_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let paths = CachePaths::in_dir(dir.path());
        std::fs::create_dir_all(dir.path()).unwrap();
        std::fs::write(&paths.settings, r#"{"shell": "zsh", "verbose": true}"#).unwrap();

        let settings = load_settings(&paths).unwrap();
        let config = ExecConfig::from(&settings);
        assert_eq!(config.shell, "zsh");
        assert!(config.verbose);
    }
}
