//! Protocol extension negotiation
//!
//! git-annex announces the extensions it understands with `EXTENSIONS ...`;
//! the reply lists the ones this remote will use. None are used today, but the
//! announced set is recorded for the rest of the session.

use tokio::io::{AsyncBufRead, AsyncWrite};

use super::error::ProtocolResult;
use super::message::Message;
use super::session::Session;
use crate::logging::*;

/// Extensions this remote uses, sent back in the EXTENSIONS reply
pub const EXTENSIONS_USED: &[&str] = &[];

/// Extensions announced by the controller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Extensions {
	pub info: bool,
	pub async_jobs: bool,
	pub get_git_remote_name: bool,
	pub unavailable_response: bool,
}

impl Extensions {
	/// Collect the announced extensions from the remaining parameters
	///
	/// Unknown names are ignored; parsing stops at the first parameter that
	/// cannot be taken.
	pub fn parse(message: &mut Message) -> Self {
		let mut extensions = Self::default();
		while let Ok(name) = message.next_token() {
			if !extensions.enable(&name) {
				debug!("[negotiation] Ignoring unknown extension {:?}", name);
			}
		}
		extensions
	}

	/// Turn on one extension by its wire name; false if unknown
	pub fn enable(&mut self, name: &str) -> bool {
		match name {
			"INFO" => self.info = true,
			"ASYNC" => self.async_jobs = true,
			"GETGITREMOTENAME" => self.get_git_remote_name = true,
			"UNAVAILABLERESPONSE" => self.unavailable_response = true,
			_ => return false,
		}
		true
	}
}

/// Reply line for an EXTENSIONS request
pub fn extensions_reply() -> String {
	if EXTENSIONS_USED.is_empty() {
		"EXTENSIONS".to_string()
	} else {
		format!("EXTENSIONS {}", EXTENSIONS_USED.join(" "))
	}
}

impl<R, W> Session<R, W>
where
	R: AsyncBufRead + Unpin,
	W: AsyncWrite + Unpin,
{
	/// Answer EXTENSIONS; only the first announcement of a session is kept
	pub async fn handle_extensions(&mut self, mut message: Message) -> ProtocolResult<()> {
		let announced = Extensions::parse(&mut message);
		if self.extensions.is_none() {
			debug!("[negotiation] Controller extensions: {:?}", announced);
			self.extensions = Some(announced);
		} else {
			warn!("Repeated EXTENSIONS message, keeping the first announcement");
		}
		self.send(&extensions_reply()).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_known_and_unknown() {
		let mut msg = Message::new("INFO FUTURETHING ASYNC GETGITREMOTENAME\n");
		let ext = Extensions::parse(&mut msg);
		assert!(ext.info);
		assert!(ext.async_jobs);
		assert!(ext.get_git_remote_name);
		assert!(!ext.unavailable_response);
	}

	#[test]
	fn test_parse_empty() {
		let mut msg = Message::new("\n");
		assert_eq!(Extensions::parse(&mut msg), Extensions::default());
	}

	#[test]
	fn test_parse_stops_at_malformed() {
		let mut msg = Message::new("INFO  ASYNC\n");
		let ext = Extensions::parse(&mut msg);
		assert!(ext.info);
		assert!(!ext.async_jobs);
	}

	#[test]
	fn test_reply() {
		assert_eq!(extensions_reply(), "EXTENSIONS");
	}
}

// vim: ts=4
