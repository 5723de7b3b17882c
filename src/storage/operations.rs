//! Operations spanning one or two storage handles

use std::sync::Arc;
use tracing::debug;

use super::error::StorageResult;
use super::traits::{Fs, Object};

/// Look up `name` in `fs`
pub async fn lookup_object(fs: &Arc<dyn Fs>, name: &str) -> StorageResult<Object> {
	let info = fs.new_object(name).await?;
	Ok(Object { fs: Arc::clone(fs), info })
}

/// Copy `src_name` from `src` to `dst_name` in `dst`
///
/// Fails with `ObjectNotFound` when the source does not exist.
pub async fn copy_file(
	dst: &Arc<dyn Fs>,
	src: &Arc<dyn Fs>,
	dst_name: &str,
	src_name: &str,
) -> StorageResult<u64> {
	// Look the source up first so a missing object surfaces as ObjectNotFound
	// regardless of how the backend reports failed opens
	let info = src.new_object(src_name).await?;
	let mut reader = src.open(src_name).await?;
	let written = dst.put(dst_name, &mut reader).await?;
	debug!(
		"[operations] Copied {}:{}/{} -> {}:{}/{} ({} of {} bytes)",
		src.backend(),
		src.root(),
		src_name,
		dst.backend(),
		dst.root(),
		dst_name,
		written,
		info.size
	);
	Ok(written)
}

/// Delete an object found by a previous lookup
pub async fn delete_file(object: &Object) -> StorageResult<()> {
	object.fs.remove(object.name()).await?;
	debug!(
		"[operations] Deleted {}:{}/{}",
		object.fs.backend(),
		object.fs.root(),
		object.name()
	);
	Ok(())
}

// vim: ts=4
