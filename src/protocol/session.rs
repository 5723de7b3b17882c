//! Protocol session: stream pair, line I/O and the command loop
//!
//! The remote speaks first (`VERSION 1`), then answers one controller command
//! at a time until the controller closes its end of the stream. While
//! handling a command the session may itself ask the controller something
//! ([`Session::ask`]); the exchange is strictly alternating, so at most one
//! question is ever outstanding.
//!
//! Handlers live in sibling modules as further `impl Session` blocks:
//! [`super::handlers`], [`super::configs`], [`super::negotiation`].

use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use super::configs::RemoteSettings;
use super::error::{ProtocolError, ProtocolResult};
use super::message::{trim_line_end, Message};
use super::negotiation::Extensions;
use crate::config::Config;
use crate::logging::*;
use crate::storage::Storage;

/// First line sent on every session
pub const VERSION_MESSAGE: &str = "VERSION 1";

/// Keyword that starts every answer to one of our queries
pub const VALUE_KEYWORD: &str = "VALUE";

/// Cost reported for GETCOST ("expensive remote" in git-annex terms)
pub const REMOTE_COST: u32 = 200;

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
	/// Nothing sent yet
	Unstarted,
	/// Version announced, waiting for the next command
	AwaitingCommand,
	/// Input closed or the session failed
	Closed,
}

/// Session behaviour switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
	/// Log every line sent and received at info level
	pub verbose: bool,
	/// Accept literal backend strings (":local:") as remote names in INITREMOTE
	pub allow_backend_strings: bool,
}

impl Default for SessionOptions {
	fn default() -> Self {
		Self { verbose: false, allow_backend_strings: true }
	}
}

impl SessionOptions {
	pub fn from_config(config: &Config) -> Self {
		Self { verbose: config.verbose, allow_backend_strings: config.allow_backend_strings }
	}
}

/// One protocol conversation with the controller
pub struct Session<R, W> {
	reader: R,
	writer: W,
	pub(super) storage: Arc<Storage>,
	pub(super) options: SessionOptions,
	state: SessionState,
	pub(super) extensions: Option<Extensions>,
	pub(super) configs_resolved: bool,
	pub(super) settings: RemoteSettings,
}

impl<R, W> Session<R, W>
where
	R: AsyncBufRead + Unpin,
	W: AsyncWrite + Unpin,
{
	pub fn new(reader: R, writer: W, storage: Arc<Storage>, options: SessionOptions) -> Self {
		Self {
			reader,
			writer,
			storage,
			options,
			state: SessionState::Unstarted,
			extensions: None,
			configs_resolved: false,
			settings: RemoteSettings::default(),
		}
	}

	pub fn state(&self) -> SessionState {
		self.state
	}

	/// Extensions the controller announced (all off until EXTENSIONS arrives)
	pub fn extensions(&self) -> Extensions {
		self.extensions.unwrap_or_default()
	}

	/// Settings obtained from the controller, once resolved
	pub fn settings(&self) -> Option<&RemoteSettings> {
		if self.configs_resolved {
			Some(&self.settings)
		} else {
			None
		}
	}

	pub fn storage(&self) -> &Arc<Storage> {
		&self.storage
	}

	/// Give back the streams (tests inspect the writer)
	pub fn into_parts(self) -> (R, W) {
		(self.reader, self.writer)
	}

	/// Send one line to the controller
	///
	/// Line terminators inside `msg` are flattened so the message stays a
	/// single protocol line.
	pub async fn send(&mut self, msg: &str) -> ProtocolResult<()> {
		let line = trim_line_end(msg).replace(|c: char| c == '\r' || c == '\n', " ");
		if self.options.verbose {
			info!("sent {:?}", line);
		} else {
			trace!("sent {:?}", line);
		}
		self.writer.write_all(line.as_bytes()).await?;
		self.writer.write_all(b"\n").await?;
		self.writer.flush().await?;
		Ok(())
	}

	/// Read one line from the controller
	///
	/// Returns `None` when the controller closed the stream cleanly. A final
	/// line without a newline is an error.
	pub async fn get_message(&mut self) -> ProtocolResult<Option<Message>> {
		let mut line = String::new();
		let n = self.reader.read_line(&mut line).await?;
		if n == 0 {
			return Ok(None);
		}
		if !line.ends_with('\n') {
			return Err(ProtocolError::UnexpectedEof(format!(
				"expected message to end with newline: {:?}",
				line
			)));
		}
		if self.options.verbose {
			info!("received {:?}", line);
		} else {
			trace!("received {:?}", line);
		}
		Ok(Some(Message::new(line)))
	}

	/// Ask the controller a question and wait for its `VALUE` answer
	///
	/// The returned message is positioned just after the `VALUE` keyword;
	/// where the answer sits in the rest of the line depends on the query.
	pub async fn ask(&mut self, query: &str) -> ProtocolResult<Message> {
		self.send(query).await?;
		let mut answer = self.get_message().await?.ok_or_else(|| {
			ProtocolError::UnexpectedEof(format!("no answer to {:?}", query))
		})?;

		match answer.next_token() {
			Ok(ref keyword) if keyword == VALUE_KEYWORD => Ok(answer),
			Ok(keyword) => Err(ProtocolError::ProtocolViolation(format!(
				"expected {} in answer to {:?}, got {:?}",
				VALUE_KEYWORD, query, keyword
			))),
			Err(e) => Err(ProtocolError::ProtocolViolation(format!(
				"cannot parse answer to {:?}: {}",
				query, e
			))),
		}
	}

	/// Tell the controller the session is about to end because of `err`
	pub async fn send_error(&mut self, err: &ProtocolError) -> ProtocolResult<()> {
		self.send(&format!("ERROR {}", err)).await
	}

	/// Announce the protocol version and serve commands until end of input
	pub async fn run(&mut self) -> ProtocolResult<()> {
		let result = self.serve_commands().await;
		self.state = SessionState::Closed;
		result
	}

	async fn serve_commands(&mut self) -> ProtocolResult<()> {
		self.send(VERSION_MESSAGE).await?;
		self.state = SessionState::AwaitingCommand;

		while let Some(mut message) = self.get_message().await? {
			let command = message.next_token()?;
			debug!("[session] Handling {}", command);
			self.dispatch(&command, message).await?;
		}

		debug!("[session] Controller closed the stream");
		Ok(())
	}

	async fn dispatch(&mut self, command: &str, mut message: Message) -> ProtocolResult<()> {
		match command {
			// Required by the controller
			"INITREMOTE" => self.handle_init_remote().await,
			"PREPARE" => self.handle_prepare().await,
			"EXPORTSUPPORTED" => self.send("EXPORTSUPPORTED-FAILURE").await,
			"TRANSFER" => self.handle_transfer(message).await,
			"CHECKPRESENT" => self.handle_check_present(message).await,
			"REMOVE" => self.handle_remove(message).await,
			"ERROR" => Err(ProtocolError::Controller(message.final_token())),

			// Optional
			"EXTENSIONS" => self.handle_extensions(message).await,
			"LISTCONFIGS" => self.list_configs().await,
			"GETCOST" => self.send(&format!("COST {}", REMOTE_COST)).await,
			"GETAVAILABILITY" => self.send("AVAILABILITY GLOBAL").await,
			"CLAIMURL" | "CHECKURL" | "WHEREIS" | "GETINFO" => {
				self.send("UNSUPPORTED-REQUEST").await
			}

			_ => {
				let rest = message.remaining();
				let line =
					if rest.is_empty() { command.to_string() } else { format!("{} {}", command, rest) };
				Err(ProtocolError::UnexpectedCommand(line))
			}
		}
	}
}


// vim: ts=4
