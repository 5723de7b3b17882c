//! Key placement inside the remote prefix
//!
//! Layouts other than `nodir` spread keys over hash directories. The hash is
//! computed by git-annex and fetched with a DIRHASH query, which is why
//! locator construction needs a way back to the controller
//! ([`ControllerQuery`]).

use async_trait::async_trait;
use std::fmt;
use tokio::io::{AsyncBufRead, AsyncWrite};

use super::error::{ProtocolError, ProtocolResult};
use super::session::Session;

/// Layout modes understood by the remote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMode {
	/// `<prefix>/<dirhash-lower>/<key>`
	Lower,
	/// `<prefix>/<dirhash-lower><key>/<key>`
	Directory,
	/// `<prefix>/<key>`
	Nodir,
	/// `<prefix>/<dirhash>/<key>`
	Mixed,
	/// `<prefix>/<lowercased dirhash>/<key>`
	Frankencase,
	/// Anything else
	Unknown,
}

impl LayoutMode {
	/// Every recognized mode, in documentation order
	pub const ALL: [LayoutMode; 5] = [
		LayoutMode::Lower,
		LayoutMode::Directory,
		LayoutMode::Nodir,
		LayoutMode::Mixed,
		LayoutMode::Frankencase,
	];

	/// Exact, case-sensitive match; anything else is [`LayoutMode::Unknown`]
	pub fn parse(s: &str) -> Self {
		match s {
			"lower" => LayoutMode::Lower,
			"directory" => LayoutMode::Directory,
			"nodir" => LayoutMode::Nodir,
			"mixed" => LayoutMode::Mixed,
			"frankencase" => LayoutMode::Frankencase,
			_ => LayoutMode::Unknown,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			LayoutMode::Lower => "lower",
			LayoutMode::Directory => "directory",
			LayoutMode::Nodir => "nodir",
			LayoutMode::Mixed => "mixed",
			LayoutMode::Frankencase => "frankencase",
			LayoutMode::Unknown => "unknown",
		}
	}

	/// The DIRHASH query this mode needs for `key`, if any
	pub fn dirhash_query(&self, key: &str) -> Option<String> {
		match self {
			LayoutMode::Lower | LayoutMode::Directory => Some(format!("DIRHASH-LOWER {}", key)),
			LayoutMode::Mixed | LayoutMode::Frankencase => Some(format!("DIRHASH {}", key)),
			LayoutMode::Nodir | LayoutMode::Unknown => None,
		}
	}
}

impl fmt::Display for LayoutMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Asks the controller a question in the middle of a command
#[async_trait(?Send)]
pub trait ControllerQuery {
	/// Send `query` and return the single value of the `VALUE` answer
	async fn query_value(&mut self, query: &str) -> ProtocolResult<String>;
}

#[async_trait(?Send)]
impl<R, W> ControllerQuery for Session<R, W>
where
	R: AsyncBufRead + Unpin,
	W: AsyncWrite + Unpin,
{
	async fn query_value(&mut self, query: &str) -> ProtocolResult<String> {
		let mut answer = self.ask(query).await?;
		Ok(answer.next_token()?)
	}
}

/// Locator of the directory holding `key` on the remote
///
/// The result is `<remote>:<prefix>` plus the layout's hash directory; the
/// key itself is the object name inside that directory. A `:` is appended to
/// `remote_name` when missing.
pub async fn build_locator<Q>(
	query: &mut Q,
	layout: LayoutMode,
	key: &str,
	remote_name: &str,
	prefix: &str,
) -> ProtocolResult<String>
where
	Q: ControllerQuery + ?Sized,
{
	let mut locator = remote_name.to_string();
	if !locator.ends_with(':') {
		locator.push(':');
	}
	locator.push_str(prefix);

	let query_text = match layout.dirhash_query(key) {
		Some(q) => q,
		None if layout == LayoutMode::Nodir => return Ok(locator),
		None => return Err(ProtocolError::Other(format!("unknown layout mode: {}", layout))),
	};

	let dirhash = query.query_value(&query_text).await?;
	locator.push('/');
	match layout {
		LayoutMode::Directory => {
			locator.push_str(&dirhash);
			locator.push_str(key);
		}
		LayoutMode::Frankencase => locator.push_str(&dirhash.to_lowercase()),
		_ => locator.push_str(&dirhash),
	}
	Ok(locator)
}


// vim: ts=4
