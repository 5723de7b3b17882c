//! Local filesystem backend
//!
//! Objects are plain files below the handle's root directory. Writes go to a
//! temporary file next to the destination and are renamed into place once
//! complete, so a reader never sees a partial object.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs as afs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::error::{StorageError, StorageResult};
use super::traits::{Fs, ObjectInfo, ObjectReader};

/// Suffix of in-flight temporary files
pub const TEMP_SUFFIX: &str = ".AnNeXr-TmP";

/// Handle rooted at a local directory
#[derive(Debug)]
pub struct LocalFs {
	root: String,
	base_path: PathBuf,
}

impl LocalFs {
	pub fn new(root: &str) -> Self {
		let base_path = if root.is_empty() { PathBuf::from(".") } else { PathBuf::from(root) };
		Self { root: root.to_string(), base_path }
	}

	/// Map an object name to a path below the root, rejecting traversal
	fn object_path(&self, name: &str) -> StorageResult<PathBuf> {
		let rel = Path::new(name);
		let safe = !name.is_empty()
			&& rel.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
		if !safe {
			return Err(StorageError::InvalidName { name: name.to_string() });
		}
		Ok(self.base_path.join(rel))
	}
}

fn map_not_found(e: std::io::Error, name: &str) -> StorageError {
	if e.kind() == std::io::ErrorKind::NotFound {
		StorageError::ObjectNotFound { name: name.to_string() }
	} else {
		StorageError::Io(e)
	}
}

#[async_trait]
impl Fs for LocalFs {
	fn backend(&self) -> &str {
		"local"
	}

	fn root(&self) -> &str {
		&self.root
	}

	async fn new_object(&self, name: &str) -> StorageResult<ObjectInfo> {
		let path = self.object_path(name)?;
		let meta = afs::metadata(&path).await.map_err(|e| map_not_found(e, name))?;
		if meta.is_dir() {
			return Err(StorageError::IsDir { name: name.to_string() });
		}
		Ok(ObjectInfo { name: name.to_string(), size: meta.len() })
	}

	async fn open(&self, name: &str) -> StorageResult<ObjectReader> {
		let path = self.object_path(name)?;
		let file = afs::File::open(&path).await.map_err(|e| map_not_found(e, name))?;
		Ok(Box::new(file))
	}

	async fn put(&self, name: &str, src: &mut ObjectReader) -> StorageResult<u64> {
		let full_path = self.object_path(name)?;
		if let Some(parent) = full_path.parent() {
			afs::create_dir_all(parent).await?;
		}

		let mut tmp_name = full_path.clone().into_os_string();
		tmp_name.push(format!(".{}{}", uuid::Uuid::new_v4().simple(), TEMP_SUFFIX));
		let tmp_path = PathBuf::from(tmp_name);

		let result = async {
			let mut file = afs::File::create(&tmp_path).await?;
			let written = tokio::io::copy(src, &mut file).await?;
			file.flush().await?;
			file.sync_all().await?;
			drop(file);
			afs::rename(&tmp_path, &full_path).await?;
			Ok::<u64, std::io::Error>(written)
		}
		.await;

		match result {
			Ok(written) => {
				debug!("[local] Stored {} ({} bytes)", full_path.display(), written);
				Ok(written)
			}
			Err(e) => {
				if let Err(cleanup) = afs::remove_file(&tmp_path).await {
					if cleanup.kind() != std::io::ErrorKind::NotFound {
						warn!("Failed to remove temp file {}: {}", tmp_path.display(), cleanup);
					}
				}
				Err(StorageError::Io(e))
			}
		}
	}

	async fn remove(&self, name: &str) -> StorageResult<()> {
		let path = self.object_path(name)?;
		afs::remove_file(&path).await.map_err(|e| map_not_found(e, name))
	}
}


// vim: ts=4
