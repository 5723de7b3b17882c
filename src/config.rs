//! Process configuration for annexr
//!
//! This is the configuration of the annexr process itself (logging, remote
//! definitions), not the per-repository settings git-annex hands over
//! through GETCONFIG; those live in [`crate::protocol::configs`].
//!
//! The configuration follows a priority chain:
//! 1. Built-in defaults (Config::default())
//! 2. Config file (~/.config/annexr/config.toml or config.json)
//! 3. Environment variables (ANNEXR_* prefix)
//! 4. CLI flags (highest priority)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::{env, fs};

use crate::error::AppError;
use crate::storage::locator::is_valid_name;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "ANNEXR_CONFIG";

/// Prefix of remotes defined in the environment:
/// `ANNEXR_REMOTE_<NAME>_TYPE`, `ANNEXR_REMOTE_<NAME>_ROOT`,
/// `ANNEXR_REMOTE_<NAME>_OPT_<KEY>`
pub const REMOTE_ENV_PREFIX: &str = "ANNEXR_REMOTE_";

// ============================================================================
// MAIN CONFIGURATION STRUCT
// ============================================================================

/// Unified configuration for the annexr process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
	/// Log a transcript of every protocol line sent and received
	pub verbose: bool,

	/// Log level (trace, debug, info, warn, error) when RUST_LOG is unset
	pub log_level: String,

	/// Accept literal backend strings such as ":local:" as remote names
	pub allow_backend_strings: bool,

	/// Named storage remotes
	pub remotes: BTreeMap<String, RemoteDefinition>,
}

impl Default for Config {
	fn default() -> Self {
		Config {
			verbose: false,
			log_level: "warn".to_string(),
			allow_backend_strings: true,
			remotes: BTreeMap::new(),
		}
	}
}

/// A named, preconfigured backend instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDefinition {
	/// Backend name ("local", "memory", ...)
	#[serde(rename = "type")]
	pub backend: String,

	/// Location inside the backend that remote paths are relative to
	#[serde(default)]
	pub root: Option<String>,

	/// Backend-specific options
	#[serde(default)]
	pub options: BTreeMap<String, String>,
}

impl RemoteDefinition {
	pub fn new(backend: &str, root: Option<&str>) -> Self {
		Self {
			backend: backend.to_string(),
			root: root.map(|r| r.to_string()),
			options: BTreeMap::new(),
		}
	}
}

impl Config {
	/// Load configuration: defaults, then file, then process environment
	///
	/// An explicitly named file (argument or `ANNEXR_CONFIG`) must exist; the
	/// default location is optional.
	pub fn load(explicit: Option<&Path>) -> Result<Self, AppError> {
		let explicit = explicit.map(PathBuf::from).or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from));

		let mut config = match explicit {
			Some(path) => Self::from_file(&path)?,
			None => match default_config_path() {
				Some(path) if path.exists() => Self::from_file(&path)?,
				_ => Config::default(),
			},
		};

		config.apply_env(env::vars())?;
		Ok(config)
	}

	/// Parse a config file; `.json` files as JSON, anything else as TOML
	pub fn from_file(path: &Path) -> Result<Self, AppError> {
		let text = fs::read_to_string(path).map_err(|e| AppError::InvalidConfig {
			message: format!("Cannot read {}: {}", path.display(), e),
		})?;

		let is_json = path.extension().map(|ext| ext == "json").unwrap_or(false);
		let config: Config = if is_json {
			serde_json::from_str(&text).map_err(|e| AppError::InvalidConfig {
				message: format!("{}: {}", path.display(), e),
			})?
		} else {
			toml::from_str(&text).map_err(|e| AppError::InvalidConfig {
				message: format!("{}: {}", path.display(), e),
			})?
		};

		config.validate()?;
		Ok(config)
	}

	/// Overlay settings from environment variables
	pub fn apply_env<I>(&mut self, vars: I) -> Result<(), AppError>
	where
		I: IntoIterator<Item = (String, String)>,
	{
		let mut env_remotes: BTreeMap<String, RemoteDefinition> = BTreeMap::new();

		for (key, value) in vars {
			match key.as_str() {
				"ANNEXR_VERBOSE" => self.verbose = parse_bool(&key, &value)?,
				"ANNEXR_LOG_LEVEL" => self.log_level = value,
				"ANNEXR_ALLOW_BACKEND_STRINGS" => {
					self.allow_backend_strings = parse_bool(&key, &value)?
				}
				_ => {
					if let Some(rest) = key.strip_prefix(REMOTE_ENV_PREFIX) {
						apply_remote_var(&mut env_remotes, rest, value);
					}
				}
			}
		}

		for (name, remote) in env_remotes {
			if remote.backend.is_empty() {
				return Err(AppError::InvalidConfig {
					message: format!("remote {:?} from environment has no _TYPE", name),
				});
			}
			self.remotes.insert(name, remote);
		}

		self.validate()
	}

	/// Check remote names and definitions
	pub fn validate(&self) -> Result<(), AppError> {
		for (name, remote) in &self.remotes {
			if !is_valid_name(name) {
				return Err(AppError::InvalidConfig { message: format!("invalid remote name {:?}", name) });
			}
			if remote.backend.is_empty() {
				return Err(AppError::InvalidConfig {
					message: format!("remote {:?} has no type", name),
				});
			}
		}
		Ok(())
	}
}

/// `$XDG_CONFIG_HOME/annexr/config.toml`, else `$HOME/.config/annexr/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
	let base = match env::var_os("XDG_CONFIG_HOME") {
		Some(dir) if !dir.is_empty() => PathBuf::from(dir),
		_ => PathBuf::from(env::var_os("HOME")?).join(".config"),
	};
	Some(base.join("annexr").join("config.toml"))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, AppError> {
	match value.to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" | "" => Ok(false),
		_ => Err(AppError::InvalidConfig { message: format!("{}: not a boolean: {:?}", key, value) }),
	}
}

/// Handle one `<NAME>_TYPE` / `<NAME>_ROOT` / `<NAME>_OPT_<KEY>` suffix
fn apply_remote_var(remotes: &mut BTreeMap<String, RemoteDefinition>, rest: &str, value: String) {
	let (name, field) = if let Some(pos) = rest.find("_OPT_") {
		(&rest[..pos], &rest[pos + 1..])
	} else if let Some(name) = rest.strip_suffix("_TYPE") {
		(name, "TYPE")
	} else if let Some(name) = rest.strip_suffix("_ROOT") {
		(name, "ROOT")
	} else {
		return;
	};
	if name.is_empty() {
		return;
	}

	let remote = remotes.entry(name.to_ascii_lowercase()).or_insert_with(|| RemoteDefinition {
		backend: String::new(),
		root: None,
		options: BTreeMap::new(),
	});
	match field {
		"TYPE" => remote.backend = value,
		"ROOT" => remote.root = Some(value),
		_ => {
			if let Some(opt) = field.strip_prefix("OPT_") {
				remote.options.insert(opt.to_ascii_lowercase(), value);
			}
		}
	}
}


// vim: ts=4
