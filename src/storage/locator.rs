//! Locator string parsing
//!
//! A locator names a place in some storage backend:
//!
//! - `name:path` refers to the configured remote `name`
//! - `:backend:path` or `:backend,key=value,...:path` instantiates a backend
//!   directly, without a configured remote
//! - anything else is a path on the local filesystem

use std::collections::BTreeMap;

use super::error::{StorageError, StorageResult};

/// Where a locator points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocatorTarget {
	/// Configured remote, by name
	Remote(String),
	/// Literal backend with inline options
	Backend { name: String, options: BTreeMap<String, String> },
	/// Local filesystem
	Local,
}

/// A parsed locator string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
	pub target: LocatorTarget,
	pub path: String,
}

impl Locator {
	pub fn parse(s: &str) -> StorageResult<Self> {
		if let Some(rest) = s.strip_prefix(':') {
			let end = rest.find(':').ok_or_else(|| invalid(s, "missing ':' after backend name"))?;
			let head = &rest[..end];
			let path = &rest[end + 1..];

			let mut parts = head.split(',');
			let name = parts.next().unwrap_or_default();
			if !is_valid_name(name) {
				return Err(invalid(s, "bad backend name"));
			}

			let mut options = BTreeMap::new();
			for part in parts {
				let (key, value) = match part.find('=') {
					Some(pos) => (&part[..pos], &part[pos + 1..]),
					None => (part, "true"),
				};
				if !is_valid_name(key) {
					return Err(invalid(s, "bad option name"));
				}
				options.insert(key.to_string(), value.to_string());
			}

			return Ok(Locator {
				target: LocatorTarget::Backend { name: name.to_string(), options },
				path: path.to_string(),
			});
		}

		// Paths like "./a:b" or "/tmp/x:y" stay local; only a bare name before
		// the first colon makes this a remote reference.
		if let Some(pos) = s.find(':') {
			let name = &s[..pos];
			if is_valid_name(name) && !looks_like_path(name) {
				return Ok(Locator {
					target: LocatorTarget::Remote(name.to_string()),
					path: s[pos + 1..].to_string(),
				});
			}
		}

		Ok(Locator { target: LocatorTarget::Local, path: s.to_string() })
	}
}

fn invalid(locator: &str, reason: &str) -> StorageError {
	StorageError::InvalidLocator { locator: locator.to_string(), reason: reason.to_string() }
}

/// Remote and backend names: letters, digits, '_', '-', '.', not starting with '-'
pub fn is_valid_name(name: &str) -> bool {
	!name.is_empty()
		&& !name.starts_with('-')
		&& name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
}

fn looks_like_path(name: &str) -> bool {
	name.starts_with('.') || name.starts_with('~')
}

/// Join a root and a relative path with exactly one separator
pub fn join_path(root: &str, path: &str) -> String {
	let path = path.trim_start_matches('/');
	if root.is_empty() {
		return path.to_string();
	}
	if path.is_empty() {
		return root.to_string();
	}
	format!("{}/{}", root.trim_end_matches('/'), path)
}


// vim: ts=4
