//! Storage error types

use std::fmt;
use std::io;

/// Storage error type
#[derive(Debug)]
pub enum StorageError {
	/// The named object does not exist (an expected, recoverable outcome)
	ObjectNotFound { name: String },
	/// The name refers to a directory, not an object
	IsDir { name: String },
	/// Object name would escape the handle's root
	InvalidName { name: String },
	/// Locator string could not be parsed
	InvalidLocator { locator: String, reason: String },
	/// No remote with this name is configured
	RemoteNotFound { name: String },
	/// No backend with this name is registered
	BackendNotFound { name: String },
	/// I/O error from the backing store
	Io(io::Error),
	/// Generic error message
	Other(String),
}

impl StorageError {
	/// Whether this is the "object does not exist" outcome
	pub fn is_not_found(&self) -> bool {
		matches!(self, StorageError::ObjectNotFound { .. })
	}
}

impl fmt::Display for StorageError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			StorageError::ObjectNotFound { name } => write!(f, "object not found: {}", name),
			StorageError::IsDir { name } => write!(f, "is a directory not a file: {}", name),
			StorageError::InvalidName { name } => write!(f, "invalid object name: {:?}", name),
			StorageError::InvalidLocator { locator, reason } => {
				write!(f, "invalid locator {:?}: {}", locator, reason)
			}
			StorageError::RemoteNotFound { name } => write!(f, "remote does not exist: {}", name),
			StorageError::BackendNotFound { name } => {
				write!(f, "backend does not exist: {}", name)
			}
			StorageError::Io(e) => write!(f, "I/O error: {}", e),
			StorageError::Other(msg) => write!(f, "{}", msg),
		}
	}
}

impl std::error::Error for StorageError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			StorageError::Io(e) => Some(e),
			_ => None,
		}
	}
}

impl From<io::Error> for StorageError {
	fn from(e: io::Error) -> Self {
		StorageError::Io(e)
	}
}

impl From<String> for StorageError {
	fn from(e: String) -> Self {
		StorageError::Other(e)
	}
}

impl From<&str> for StorageError {
	fn from(e: &str) -> Self {
		StorageError::Other(e.to_string())
	}
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

// vim: ts=4
