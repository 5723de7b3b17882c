//! Error types for annexr
//!
//! Protocol- and storage-level errors live next to their modules
//! ([`crate::protocol::ProtocolError`], [`crate::storage::StorageError`]);
//! this is the top-level error the binary reports.

use std::error::Error;
use std::fmt;

use crate::protocol::ProtocolError;

/// Main error type for the annexr process
#[derive(Debug)]
pub enum AppError {
	/// Invalid configuration
	InvalidConfig { message: String },

	/// The protocol session ended abnormally
	Protocol(ProtocolError),

	/// Invalid command line usage
	Usage { message: String },
}

impl fmt::Display for AppError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			AppError::InvalidConfig { message } => write!(f, "Invalid configuration: {}", message),
			AppError::Protocol(e) => write!(f, "{}", e),
			AppError::Usage { message } => write!(f, "{}", message),
		}
	}
}

impl Error for AppError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			AppError::Protocol(e) => Some(e),
			_ => None,
		}
	}
}

impl From<ProtocolError> for AppError {
	fn from(e: ProtocolError) -> Self {
		AppError::Protocol(e)
	}
}


// vim: ts=4
