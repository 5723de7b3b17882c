//! Command handlers
//!
//! Every refusal is reported to git-annex with the command's failure line
//! before the handler returns an error, which ends the session. Two negative
//! outcomes are ordinary answers and keep the session going: a key missing on
//! RETRIEVE or CHECKPRESENT, and a key already gone on REMOVE.

use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncWrite};

use super::error::{ProtocolError, ProtocolResult};
use super::layout::{build_locator, LayoutMode};
use super::message::Message;
use super::session::Session;
use crate::logging::*;
use crate::storage::{copy_file, delete_file, lookup_object, Fs, Locator, LocatorTarget, StorageResult};

/// Direction of a TRANSFER, as seen from the remote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
	/// Local file to remote
	Store,
	/// Remote to local file
	Retrieve,
}

impl TransferDirection {
	pub fn parse(s: &str) -> Option<Self> {
		match s {
			"STORE" => Some(TransferDirection::Store),
			"RETRIEVE" => Some(TransferDirection::Retrieve),
			_ => None,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			TransferDirection::Store => "STORE",
			TransferDirection::Retrieve => "RETRIEVE",
		}
	}
}

/// Copy one key between the remote and the local directory
async fn transfer_copy(
	direction: TransferDirection,
	remote_fs: &Arc<dyn Fs>,
	local_fs: &Arc<dyn Fs>,
	key: &str,
	local_name: &str,
) -> StorageResult<u64> {
	match direction {
		TransferDirection::Store => copy_file(remote_fs, local_fs, key, local_name).await,
		TransferDirection::Retrieve => copy_file(local_fs, remote_fs, local_name, key).await,
	}
}

impl<R, W> Session<R, W>
where
	R: AsyncBufRead + Unpin,
	W: AsyncWrite + Unpin,
{
	/// Send a failure line, then fail with `err`
	async fn reject(&mut self, line: String, err: ProtocolError) -> ProtocolResult<()> {
		self.send(&line).await?;
		Err(err)
	}

	/// Locator of the directory that holds `key` on the configured remote
	async fn key_locator(&mut self, key: &str) -> ProtocolResult<String> {
		let layout = LayoutMode::parse(&self.settings.layout);
		if layout == LayoutMode::Unknown {
			return Err(ProtocolError::Other(format!(
				"error parsing layout mode: {:?}",
				self.settings.layout
			)));
		}

		let remote_name = self.settings.remote_name.clone();
		let prefix = self.settings.prefix.clone();
		let locator = build_locator(self, layout, key, &remote_name, &prefix).await?;
		trace!("[handlers] {} -> {}", key, locator);
		Ok(locator)
	}

	// ========================================================================
	// INITREMOTE / PREPARE
	// ========================================================================

	/// Validate the configured remote name
	///
	/// Accepts names of configured remotes (with or without a trailing ':')
	/// and, when allowed, bare backend strings such as ":local:".
	pub async fn handle_init_remote(&mut self) -> ProtocolResult<()> {
		if let Err(e) = self.resolve_configs().await {
			return self
				.reject(format!("INITREMOTE-FAILURE failed to get configs: {}", e), e)
				.await;
		}

		let name = self.settings.remote_name.clone();
		let trimmed = name.strip_suffix(':').unwrap_or(&name);
		if self.storage.list_known_remote_names().iter().any(|known| known == trimmed) {
			return self.send("INITREMOTE-SUCCESS").await;
		}

		if !name.starts_with(':') {
			let reason = format!("remote does not exist: {}", name);
			return self.reject(format!("INITREMOTE-FAILURE {}", reason), ProtocolError::Rejected(reason)).await;
		}
		if !self.options.allow_backend_strings {
			let reason = format!("backend strings are not permitted: {}", name);
			return self.reject(format!("INITREMOTE-FAILURE {}", reason), ProtocolError::Rejected(reason)).await;
		}

		let (backend, path) = match Locator::parse(&name) {
			Ok(Locator { target: LocatorTarget::Backend { name: backend, .. }, path }) => (backend, path),
			_ => {
				let reason = format!("remote could not be parsed as a backend: {}", name);
				return self
					.reject(format!("INITREMOTE-FAILURE {}", reason), ProtocolError::Rejected(reason))
					.await;
			}
		};
		if !path.is_empty() {
			let reason = format!("backend must not have a path: {}", name);
			return self.reject(format!("INITREMOTE-FAILURE {}", reason), ProtocolError::Rejected(reason)).await;
		}
		if self.storage.find_backend(&backend).is_none() {
			let reason = format!("backend does not exist: {}", backend);
			return self.reject(format!("INITREMOTE-FAILURE {}", reason), ProtocolError::Rejected(reason)).await;
		}

		self.send("INITREMOTE-SUCCESS").await
	}

	pub async fn handle_prepare(&mut self) -> ProtocolResult<()> {
		if let Err(e) = self.resolve_configs().await {
			return self.reject(format!("PREPARE-FAILURE Error getting configs: {}", e), e).await;
		}
		self.send("PREPARE-SUCCESS").await
	}

	// ========================================================================
	// TRANSFER
	// ========================================================================

	/// `TRANSFER <STORE|RETRIEVE> <key> <file>`; the file name may contain spaces
	pub async fn handle_transfer(&mut self, mut message: Message) -> ProtocolResult<()> {
		let mode = match message.next_token() {
			Ok(mode) => mode,
			Err(e) => {
				return self.reject("TRANSFER-FAILURE failed to parse direction".to_string(), e.into()).await
			}
		};
		let key = match message.next_token() {
			Ok(key) => key,
			Err(e) => return self.reject("TRANSFER-FAILURE failed to parse key".to_string(), e.into()).await,
		};
		let file = message.final_token();
		if file.is_empty() {
			return self
				.reject(
					"TRANSFER-FAILURE failed to parse file path".to_string(),
					ProtocolError::ProtocolViolation("failed to parse file path".to_string()),
				)
				.await;
		}

		let direction = match TransferDirection::parse(&mode) {
			Some(direction) => direction,
			None => {
				return self
					.reject(
						format!("TRANSFER-FAILURE {} {} unrecognized mode", mode, key),
						ProtocolError::ProtocolViolation(format!("received malformed TRANSFER mode: {}", mode)),
					)
					.await
			}
		};

		if let Err(e) = self.resolve_configs().await {
			return self.reject(format!("TRANSFER-FAILURE {} {} failed to get configs", mode, key), e).await;
		}

		let locator = match self.key_locator(&key).await {
			Ok(locator) => locator,
			Err(e) => return self.reject(format!("TRANSFER-FAILURE {} {} {}", mode, key, e), e).await,
		};
		let remote_fs = match self.storage.resolve_handle(&locator).await {
			Ok(fs) => fs,
			Err(e) => {
				return self
					.reject(format!("TRANSFER-FAILURE {} {} failed to get remote fs", mode, key), e.into())
					.await
			}
		};

		let path = Path::new(&file);
		let local_name = match path.file_name() {
			Some(name) => name.to_string_lossy().into_owned(),
			None => {
				return self
					.reject(
						format!("TRANSFER-FAILURE {} {} failed to parse file path", mode, key),
						ProtocolError::ProtocolViolation(format!("no file name in {:?}", file)),
					)
					.await
			}
		};
		let local_dir = match path.parent() {
			Some(dir) if !dir.as_os_str().is_empty() => dir.to_string_lossy().into_owned(),
			_ => ".".to_string(),
		};
		let local_fs = match self.storage.local_dir(&local_dir).await {
			Ok(fs) => fs,
			Err(e) => {
				return self
					.reject(format!("TRANSFER-FAILURE {} {} failed to get local fs", mode, key), e.into())
					.await
			}
		};

		match transfer_copy(direction, &remote_fs, &local_fs, &key, &local_name).await {
			Ok(bytes) => {
				debug!("[handlers] {} {} done ({} bytes)", direction.as_str(), key, bytes);
				self.send(&format!("TRANSFER-SUCCESS {} {}", mode, key)).await
			}
			Err(e) if direction == TransferDirection::Retrieve && e.is_not_found() => {
				self.send(&format!("TRANSFER-FAILURE {} {} not found", mode, key)).await
			}
			Err(e) => {
				self.reject(format!("TRANSFER-FAILURE {} {} failed to copy file: {}", mode, key, e), e.into())
					.await
			}
		}
	}

	// ========================================================================
	// CHECKPRESENT / REMOVE
	// ========================================================================

	/// CHECKPRESENT answers SUCCESS, FAILURE (absent) or UNKNOWN (could not tell)
	///
	/// FAILURE carries nothing but the key; reasons only go with UNKNOWN.
	pub async fn handle_check_present(&mut self, mut message: Message) -> ProtocolResult<()> {
		let key = message.final_token();
		if key.is_empty() {
			return Err(ProtocolError::ProtocolViolation("failed to parse key for CHECKPRESENT".to_string()));
		}

		if let Err(e) = self.resolve_configs().await {
			return self.reject(format!("CHECKPRESENT-FAILURE {}", key), e).await;
		}

		let locator = match self.key_locator(&key).await {
			Ok(locator) => locator,
			Err(e) => return self.reject(format!("CHECKPRESENT-FAILURE {}", key), e).await,
		};
		let remote_fs = match self.storage.resolve_handle(&locator).await {
			Ok(fs) => fs,
			Err(e) => {
				return self
					.reject(format!("CHECKPRESENT-UNKNOWN {} failed to get remote fs", key), e.into())
					.await
			}
		};

		match lookup_object(&remote_fs, &key).await {
			Ok(_) => self.send(&format!("CHECKPRESENT-SUCCESS {}", key)).await,
			Err(e) if e.is_not_found() => self.send(&format!("CHECKPRESENT-FAILURE {}", key)).await,
			Err(e) => self.reject(format!("CHECKPRESENT-UNKNOWN {} error finding file", key), e.into()).await,
		}
	}

	/// REMOVE succeeds when the key is gone afterwards, including when it
	/// was never there
	pub async fn handle_remove(&mut self, mut message: Message) -> ProtocolResult<()> {
		let key = message.final_token();
		if key.is_empty() {
			return Err(ProtocolError::ProtocolViolation("failed to parse key for REMOVE".to_string()));
		}

		if let Err(e) = self.resolve_configs().await {
			return self.reject(format!("REMOVE-FAILURE {} failed to get configs", key), e).await;
		}

		let locator = match self.key_locator(&key).await {
			Ok(locator) => locator,
			Err(e) => return self.reject(format!("REMOVE-FAILURE {} {}", key, e), e).await,
		};
		let remote_fs = match self.storage.resolve_handle(&locator).await {
			Ok(fs) => fs,
			Err(e) => {
				return self.reject(format!("REMOVE-FAILURE {} error getting remote fs: {}", key, e), e.into()).await
			}
		};

		let object = match lookup_object(&remote_fs, &key).await {
			Ok(object) => object,
			Err(e) if e.is_not_found() => return self.send(&format!("REMOVE-SUCCESS {}", key)).await,
			Err(e) => {
				return self.reject(format!("REMOVE-FAILURE {} error getting object: {}", key, e), e.into()).await
			}
		};
		match delete_file(&object).await {
			Ok(()) => self.send(&format!("REMOVE-SUCCESS {}", key)).await,
			// Removed by someone else since the lookup
			Err(e) if e.is_not_found() => self.send(&format!("REMOVE-SUCCESS {}", key)).await,
			Err(e) => self.reject(format!("REMOVE-FAILURE {} error deleting file", key), e.into()).await,
		}
	}
}

// vim: ts=4
