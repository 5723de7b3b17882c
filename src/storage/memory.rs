//! In-memory backend
//!
//! All handles created from the same [`MemoryStore`] share one object map, keyed
//! by the full path (root joined with the object name). Nothing survives the
//! process.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::sync::Mutex;

use super::error::{StorageError, StorageResult};
use super::locator::join_path;
use super::traits::{Fs, ObjectInfo, ObjectReader};

/// Object map shared by all memory handles of one storage instance
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
	objects: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Open a handle rooted at `root`
	pub fn handle(&self, root: &str) -> MemoryFs {
		MemoryFs { root: root.trim_end_matches('/').to_string(), store: self.clone() }
	}

	/// Full paths of all stored objects
	pub async fn paths(&self) -> Vec<String> {
		self.objects.lock().await.keys().cloned().collect()
	}

	/// Content stored at a full path
	pub async fn get(&self, path: &str) -> Option<Vec<u8>> {
		self.objects.lock().await.get(path).cloned()
	}

	/// Store content directly at a full path
	pub async fn insert(&self, path: &str, data: Vec<u8>) {
		self.objects.lock().await.insert(path.to_string(), data);
	}
}

/// Handle rooted at a prefix of a [`MemoryStore`]
#[derive(Debug)]
pub struct MemoryFs {
	root: String,
	store: MemoryStore,
}

impl MemoryFs {
	fn full_path(&self, name: &str) -> StorageResult<String> {
		if name.is_empty() || name.split('/').any(|part| part == "..") {
			return Err(StorageError::InvalidName { name: name.to_string() });
		}
		Ok(join_path(&self.root, name))
	}
}

#[async_trait]
impl Fs for MemoryFs {
	fn backend(&self) -> &str {
		"memory"
	}

	fn root(&self) -> &str {
		&self.root
	}

	async fn new_object(&self, name: &str) -> StorageResult<ObjectInfo> {
		let path = self.full_path(name)?;
		let objects = self.store.objects.lock().await;
		match objects.get(&path) {
			Some(data) => Ok(ObjectInfo { name: name.to_string(), size: data.len() as u64 }),
			None => {
				let dir_prefix = format!("{}/", path);
				if objects.keys().any(|k| k.starts_with(&dir_prefix)) {
					Err(StorageError::IsDir { name: name.to_string() })
				} else {
					Err(StorageError::ObjectNotFound { name: name.to_string() })
				}
			}
		}
	}

	async fn open(&self, name: &str) -> StorageResult<ObjectReader> {
		let path = self.full_path(name)?;
		match self.store.get(&path).await {
			Some(data) => Ok(Box::new(Cursor::new(data))),
			None => Err(StorageError::ObjectNotFound { name: name.to_string() }),
		}
	}

	async fn put(&self, name: &str, src: &mut ObjectReader) -> StorageResult<u64> {
		let path = self.full_path(name)?;
		let mut data = Vec::new();
		src.read_to_end(&mut data).await?;
		let len = data.len() as u64;
		self.store.insert(&path, data).await;
		Ok(len)
	}

	async fn remove(&self, name: &str) -> StorageResult<()> {
		let path = self.full_path(name)?;
		match self.store.objects.lock().await.remove(&path) {
			Some(_) => Ok(()),
			None => Err(StorageError::ObjectNotFound { name: name.to_string() }),
		}
	}
}


// vim: ts=4
