//! Per-repository settings negotiated with git-annex
//!
//! Each setting has a canonical name followed by accepted synonyms. Values are
//! fetched with `GETCONFIG <name>`, trying the names in order; the first
//! non-empty answer wins, then the default, else the session fails.

use tokio::io::{AsyncBufRead, AsyncWrite};

use super::error::{ProtocolError, ProtocolResult};
use super::layout::LayoutMode;
use super::session::Session;
use crate::logging::*;

/// Directory written under the remote when no prefix is configured
pub const DEFAULT_PREFIX: &str = "git-annex-rclone";

/// Layout used when none is configured
pub const DEFAULT_LAYOUT: &str = "nodir";

/// Which [`RemoteSettings`] slot a definition fills
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
	RemoteName,
	Prefix,
	Layout,
}

/// A setting git-annex stores on our behalf
#[derive(Debug, Clone)]
pub struct ConfigDefinition {
	/// Canonical name first, then synonyms; never empty
	names: &'static [&'static str],
	pub description: String,
	pub field: ConfigField,
	pub default: Option<&'static str>,
}

impl ConfigDefinition {
	pub fn canonical_name(&self) -> &'static str {
		self.names.first().copied().unwrap_or("")
	}

	pub fn synonyms(&self) -> &'static [&'static str] {
		self.names.get(1..).unwrap_or(&[])
	}

	/// Canonical name first, then synonyms
	pub fn names(&self) -> &'static [&'static str] {
		self.names
	}

	/// Description as reported by LISTCONFIGS
	pub fn full_description(&self) -> String {
		let synonyms = self.synonyms();
		if synonyms.is_empty() {
			self.description.clone()
		} else {
			format!("(synonyms: {}) {}", synonyms.join(", "), self.description)
		}
	}
}

/// All settings, in the order they are resolved and listed
pub fn required_configs() -> Vec<ConfigDefinition> {
	let layouts: Vec<&str> = LayoutMode::ALL.iter().map(|mode| mode.as_str()).collect();

	vec![
		ConfigDefinition {
			names: &["rcloneremotename", "target"],
			description: "Name of the annexr remote to use. Must match a remote known to annexr, \
				or be a backend string such as \":local:\". (Note that annexr remotes are a \
				distinct concept from git-annex remotes.)"
				.to_string(),
			field: ConfigField::RemoteName,
			default: None,
		},
		ConfigDefinition {
			names: &["rcloneprefix", "prefix"],
			description: format!(
				"Directory where annexr will write git-annex content. If not specified, \
				 defaults to {:?}. This directory will be created on init if it does not exist.",
				DEFAULT_PREFIX
			),
			field: ConfigField::Prefix,
			default: Some(DEFAULT_PREFIX),
		},
		ConfigDefinition {
			names: &["rclonelayout", "rclone_layout"],
			description: format!(
				"Defines where, within the rcloneprefix directory, annexr will write git-annex \
				 content. Must be one of {}. If empty, defaults to {:?}.",
				layouts.join(", "),
				DEFAULT_LAYOUT
			),
			field: ConfigField::Layout,
			default: Some(DEFAULT_LAYOUT),
		},
	]
}

/// Resolved settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteSettings {
	pub remote_name: String,
	pub prefix: String,
	pub layout: String,
}

impl RemoteSettings {
	pub fn get(&self, field: ConfigField) -> &str {
		match field {
			ConfigField::RemoteName => &self.remote_name,
			ConfigField::Prefix => &self.prefix,
			ConfigField::Layout => &self.layout,
		}
	}

	fn slot_mut(&mut self, field: ConfigField) -> &mut String {
		match field {
			ConfigField::RemoteName => &mut self.remote_name,
			ConfigField::Prefix => &mut self.prefix,
			ConfigField::Layout => &mut self.layout,
		}
	}
}

impl<R, W> Session<R, W>
where
	R: AsyncBufRead + Unpin,
	W: AsyncWrite + Unpin,
{
	/// Fetch every setting from git-annex, once per session
	///
	/// Settings are only stored when all of them resolved, so a failed
	/// attempt is retried in full next time.
	pub async fn resolve_configs(&mut self) -> ProtocolResult<()> {
		if self.configs_resolved {
			return Ok(());
		}

		let mut settings = RemoteSettings::default();
		for def in required_configs() {
			let value = self.resolve_one(&def).await?;
			debug!("[configs] {} = {:?}", def.canonical_name(), value);
			*settings.slot_mut(def.field) = value;
		}

		self.settings = settings;
		self.configs_resolved = true;
		Ok(())
	}

	async fn resolve_one(&mut self, def: &ConfigDefinition) -> ProtocolResult<String> {
		for name in def.names() {
			let mut answer = self.ask(&format!("GETCONFIG {}", name)).await?;
			let value = answer.final_token();
			if !value.is_empty() {
				return Ok(value);
			}
		}

		def.default.map(|value| value.to_string()).ok_or_else(|| ProtocolError::MissingConfig {
			name: def.canonical_name().to_string(),
		})
	}

	/// Answer LISTCONFIGS
	pub async fn list_configs(&mut self) -> ProtocolResult<()> {
		for def in required_configs() {
			self.send(&format!("CONFIG {} {}", def.canonical_name(), def.full_description())).await?;
		}
		self.send("CONFIGEND").await
	}
}


// vim: ts=4
