//! Backend trait every storage implementation provides
//!
//! A handle (`Fs`) is rooted at one location of one backend. Object names are
//! relative to that root. The protocol session only talks to storage through
//! this trait and the helpers in [`super::operations`].

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio::io::AsyncRead;

use super::error::StorageResult;

/// Reader handed out by [`Fs::open`]
pub type ObjectReader = Box<dyn AsyncRead + Send + Unpin>;

/// A storage handle rooted at some location
#[async_trait]
pub trait Fs: Send + Sync + fmt::Debug {
	/// Name of the backend serving this handle
	fn backend(&self) -> &str;

	/// Root of this handle, as understood by the backend
	fn root(&self) -> &str;

	/// Look up an object; fails with `ObjectNotFound` when it does not exist
	async fn new_object(&self, name: &str) -> StorageResult<ObjectInfo>;

	/// Open an object for reading
	async fn open(&self, name: &str) -> StorageResult<ObjectReader>;

	/// Store an object, replacing any previous content. Readers never observe
	/// a partially written object.
	async fn put(&self, name: &str, src: &mut ObjectReader) -> StorageResult<u64>;

	/// Remove an object
	async fn remove(&self, name: &str) -> StorageResult<()>;
}

/// Metadata returned by a lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
	pub name: String,
	pub size: u64,
}

/// An object that is known to exist, together with the handle it lives in
#[derive(Debug, Clone)]
pub struct Object {
	pub fs: Arc<dyn Fs>,
	pub info: ObjectInfo,
}

impl Object {
	pub fn name(&self) -> &str {
		&self.info.name
	}

	pub fn size(&self) -> u64 {
		self.info.size
	}
}

// vim: ts=4
