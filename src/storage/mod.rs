//! Storage delegate
//!
//! The protocol session never touches files directly. It asks [`Storage`] for
//! handles by locator string and moves objects between them with the helpers
//! in [`operations`]. Backends are registered by name; remotes are named,
//! preconfigured backend instances (see [`crate::config::RemoteDefinition`]).

pub mod error;
pub mod local;
pub mod locator;
pub mod memory;
pub mod operations;
pub mod traits;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::config::{Config, RemoteDefinition};

pub use error::{StorageError, StorageResult};
pub use local::LocalFs;
pub use locator::{Locator, LocatorTarget};
pub use memory::{MemoryFs, MemoryStore};
pub use operations::{copy_file, delete_file, lookup_object};
pub use traits::{Fs, Object, ObjectInfo, ObjectReader};

/// Options passed to a backend when instantiating a handle
pub type BackendOptions = BTreeMap<String, String>;

/// Constructor for handles of one backend: `(root, options) -> handle`
pub type BackendFactory =
	Arc<dyn Fn(&str, &BackendOptions) -> StorageResult<Arc<dyn Fs>> + Send + Sync>;

/// A registered backend
#[derive(Clone)]
pub struct BackendInfo {
	pub name: String,
	pub description: String,
	factory: BackendFactory,
}

impl BackendInfo {
	pub fn new<F>(name: &str, description: &str, factory: F) -> Self
	where
		F: Fn(&str, &BackendOptions) -> StorageResult<Arc<dyn Fs>> + Send + Sync + 'static,
	{
		Self { name: name.to_string(), description: description.to_string(), factory: Arc::new(factory) }
	}

	/// Create a handle rooted at `root`
	pub fn instantiate(&self, root: &str, options: &BackendOptions) -> StorageResult<Arc<dyn Fs>> {
		(self.factory)(root, options)
	}
}

impl fmt::Debug for BackendInfo {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("BackendInfo")
			.field("name", &self.name)
			.field("description", &self.description)
			.finish()
	}
}

/// Number of handles kept by [`Storage`]; hashed layouts create one per directory
pub const HANDLE_CACHE_CAPACITY: usize = 64;

/// Handles by locator string, least recently used dropped first
struct HandleCache {
	entries: HashMap<String, (Arc<dyn Fs>, u64)>,
	capacity: usize,
	tick: u64,
}

impl HandleCache {
	fn new(capacity: usize) -> Self {
		Self { entries: HashMap::new(), capacity: capacity.max(1), tick: 0 }
	}

	fn get(&mut self, locator: &str) -> Option<Arc<dyn Fs>> {
		self.tick += 1;
		let tick = self.tick;
		self.entries.get_mut(locator).map(|(fs, used)| {
			*used = tick;
			Arc::clone(fs)
		})
	}

	fn insert(&mut self, locator: String, fs: Arc<dyn Fs>) {
		if !self.entries.contains_key(&locator) && self.entries.len() >= self.capacity {
			let oldest = self.entries.iter().min_by_key(|(_, (_, used))| *used).map(|(k, _)| k.clone());
			if let Some(oldest) = oldest {
				trace!("[storage] Dropping cached handle for {:?}", oldest);
				self.entries.remove(&oldest);
			}
		}
		self.tick += 1;
		self.entries.insert(locator, (fs, self.tick));
	}

	fn len(&self) -> usize {
		self.entries.len()
	}
}

/// Storage delegate: backend registry, configured remotes and a handle cache
pub struct Storage {
	backends: BTreeMap<String, BackendInfo>,
	remotes: BTreeMap<String, RemoteDefinition>,
	memory: MemoryStore,
	cache: Mutex<HandleCache>,
}

impl Storage {
	/// Create a delegate with the built-in backends and the given remotes
	pub fn new(remotes: BTreeMap<String, RemoteDefinition>) -> Self {
		let mut storage = Self {
			backends: BTreeMap::new(),
			remotes,
			memory: MemoryStore::new(),
			cache: Mutex::new(HandleCache::new(HANDLE_CACHE_CAPACITY)),
		};

		storage.register(BackendInfo::new("local", "Local filesystem", |root, _options| {
			Ok(Arc::new(LocalFs::new(root)) as Arc<dyn Fs>)
		}));

		let memory = storage.memory.clone();
		storage.register(BackendInfo::new(
			"memory",
			"In-memory object store (lost on exit)",
			move |root, _options| Ok(Arc::new(memory.handle(root)) as Arc<dyn Fs>),
		));

		storage
	}

	pub fn from_config(config: &Config) -> Self {
		Self::new(config.remotes.clone())
	}

	/// Register (or replace) a backend
	pub fn register(&mut self, info: BackendInfo) {
		self.backends.insert(info.name.clone(), info);
	}

	/// Object store behind the `memory` backend
	pub fn memory(&self) -> &MemoryStore {
		&self.memory
	}

	/// All registered backends, by name
	pub fn backends(&self) -> impl Iterator<Item = &BackendInfo> {
		self.backends.values()
	}

	pub fn find_backend(&self, name: &str) -> Option<&BackendInfo> {
		self.backends.get(name)
	}

	/// Names of all configured remotes, sorted
	pub fn list_known_remote_names(&self) -> Vec<String> {
		self.remotes.keys().cloned().collect()
	}

	pub fn remote(&self, name: &str) -> Option<&RemoteDefinition> {
		self.remotes.get(name)
	}

	/// Number of handles currently cached
	pub async fn cached_handles(&self) -> usize {
		self.cache.lock().await.len()
	}

	/// Get the handle a locator string points at, creating it on first use
	pub async fn resolve_handle(&self, locator: &str) -> StorageResult<Arc<dyn Fs>> {
		let mut cache = self.cache.lock().await;
		if let Some(fs) = cache.get(locator) {
			return Ok(fs);
		}

		let parsed = Locator::parse(locator)?;
		let fs = self.instantiate(&parsed)?;
		debug!("[storage] New {} handle for {:?} (root {:?})", fs.backend(), locator, fs.root());
		cache.insert(locator.to_string(), Arc::clone(&fs));
		Ok(fs)
	}

	/// Handle for a directory on the local filesystem, bypassing locator
	/// parsing so that paths containing ':' stay local
	pub async fn local_dir(&self, path: &str) -> StorageResult<Arc<dyn Fs>> {
		let key = format!(":local:{}", path);
		let mut cache = self.cache.lock().await;
		if let Some(fs) = cache.get(&key) {
			return Ok(fs);
		}

		let fs = self.backend("local")?.instantiate(path, &BackendOptions::new())?;
		cache.insert(key, Arc::clone(&fs));
		Ok(fs)
	}

	fn backend(&self, name: &str) -> StorageResult<&BackendInfo> {
		self.find_backend(name).ok_or_else(|| StorageError::BackendNotFound { name: name.to_string() })
	}

	fn instantiate(&self, locator: &Locator) -> StorageResult<Arc<dyn Fs>> {
		match &locator.target {
			LocatorTarget::Local => {
				self.backend("local")?.instantiate(&locator.path, &BackendOptions::new())
			}
			LocatorTarget::Backend { name, options } => {
				self.backend(name)?.instantiate(&locator.path, options)
			}
			LocatorTarget::Remote(name) => {
				let remote = self
					.remote(name)
					.ok_or_else(|| StorageError::RemoteNotFound { name: name.to_string() })?;
				let root = locator::join_path(remote.root.as_deref().unwrap_or(""), &locator.path);
				self.backend(&remote.backend)?.instantiate(&root, &remote.options)
			}
		}
	}
}

impl fmt::Debug for Storage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Storage")
			.field("backends", &self.backends.keys().collect::<Vec<_>>())
			.field("remotes", &self.remotes)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn remotes() -> BTreeMap<String, RemoteDefinition> {
		let mut remotes = BTreeMap::new();
		remotes.insert("mem".to_string(), RemoteDefinition::new("memory", Some("bucket")));
		remotes.insert("broken".to_string(), RemoteDefinition::new("nosuch", None));
		remotes
	}

	#[test]
	fn test_builtin_backends() {
		let storage = Storage::new(BTreeMap::new());
		let names: Vec<_> = storage.backends().map(|b| b.name.as_str()).collect();
		assert_eq!(names, vec!["local", "memory"]);
		assert!(storage.find_backend("local").is_some());
		assert!(storage.find_backend("s3").is_none());
	}

	#[test]
	fn test_list_known_remote_names() {
		let storage = Storage::new(remotes());
		assert_eq!(storage.list_known_remote_names(), vec!["broken", "mem"]);
	}

	#[tokio::test]
	async fn test_resolve_remote_joins_root() {
		let storage = Storage::new(remotes());
		let fs = storage.resolve_handle("mem:annex/x").await.unwrap();
		assert_eq!(fs.backend(), "memory");
		assert_eq!(fs.root(), "bucket/annex/x");
	}

	#[tokio::test]
	async fn test_resolve_is_cached() {
		let storage = Storage::new(remotes());
		let a = storage.resolve_handle(":memory:p").await.unwrap();
		let b = storage.resolve_handle(":memory:p").await.unwrap();
		assert!(Arc::ptr_eq(&a, &b));

		let c = storage.local_dir("/tmp").await.unwrap();
		let d = storage.local_dir("/tmp").await.unwrap();
		assert!(Arc::ptr_eq(&c, &d));
		assert_eq!(c.backend(), "local");
	}

	#[tokio::test]
	async fn test_cache_is_bounded() {
		let storage = Storage::new(remotes());
		storage.memory().insert("bucket/annex/00/00/KEY0/KEY0", b"x".to_vec()).await;

		let first = storage.resolve_handle("mem:annex/00/00/KEY0").await.unwrap();
		for i in 0..5000 {
			let locator = format!("mem:annex/{:02x}/{:02x}/KEY{}", i % 256, i / 256, i);
			storage.resolve_handle(&locator).await.unwrap();
			assert!(storage.cached_handles().await <= HANDLE_CACHE_CAPACITY);
		}
		assert_eq!(storage.cached_handles().await, HANDLE_CACHE_CAPACITY);

		// Evicted handles are rebuilt on demand and still reach the same objects
		let again = storage.resolve_handle("mem:annex/00/00/KEY0").await.unwrap();
		assert!(!Arc::ptr_eq(&first, &again));
		assert!(lookup_object(&again, "KEY0").await.is_ok());
	}

	#[tokio::test]
	async fn test_cache_keeps_recently_used() {
		let storage = Storage::new(remotes());
		let hot = storage.resolve_handle(":memory:hot").await.unwrap();
		for i in 0..HANDLE_CACHE_CAPACITY * 3 {
			storage.resolve_handle(&format!(":memory:cold{}", i)).await.unwrap();
			storage.resolve_handle(":memory:hot").await.unwrap();
		}
		let still = storage.resolve_handle(":memory:hot").await.unwrap();
		assert!(Arc::ptr_eq(&hot, &still));
	}

	#[tokio::test]
	async fn test_resolve_errors() {
		let storage = Storage::new(remotes());
		assert!(matches!(
			storage.resolve_handle("unknown:x").await,
			Err(StorageError::RemoteNotFound { .. })
		));
		assert!(matches!(
			storage.resolve_handle("broken:x").await,
			Err(StorageError::BackendNotFound { .. })
		));
		assert!(matches!(
			storage.resolve_handle(":nosuch:x").await,
			Err(StorageError::BackendNotFound { .. })
		));
		assert!(matches!(
			storage.resolve_handle(":local").await,
			Err(StorageError::InvalidLocator { .. })
		));
	}

	#[tokio::test]
	async fn test_copy_between_handles() {
		let storage = Storage::new(remotes());
		storage.memory().insert("src/KEY", b"payload".to_vec()).await;

		let src = storage.resolve_handle(":memory:src").await.unwrap();
		let dst = storage.resolve_handle("mem:dst").await.unwrap();
		let n = copy_file(&dst, &src, "KEY", "KEY").await.unwrap();
		assert_eq!(n, 7);
		assert_eq!(storage.memory().get("bucket/dst/KEY").await, Some(b"payload".to_vec()));

		let obj = lookup_object(&dst, "KEY").await.unwrap();
		assert_eq!(obj.size(), 7);
		delete_file(&obj).await.unwrap();
		assert!(lookup_object(&dst, "KEY").await.unwrap_err().is_not_found());
	}

	#[tokio::test]
	async fn test_copy_missing_source() {
		let storage = Storage::new(remotes());
		let src = storage.resolve_handle(":memory:src").await.unwrap();
		let dst = storage.resolve_handle(":memory:dst").await.unwrap();
		assert!(copy_file(&dst, &src, "a", "a").await.unwrap_err().is_not_found());
	}
}

// vim: ts=4
