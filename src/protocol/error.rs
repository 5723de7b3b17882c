//! Protocol error types
//!
//! Any of these ends the session. Handlers that refuse a request tell the
//! controller first (a `*-FAILURE` line) and then return
//! [`ProtocolError::Rejected`], so the reason also reaches the process exit.

use std::fmt;
use std::io;

use super::message::MessageError;
use crate::storage::StorageError;

/// Protocol error type
#[derive(Debug)]
pub enum ProtocolError {
	/// I/O error on the controller streams
	Io(io::Error),
	/// A line could not be tokenized as expected
	Message(MessageError),
	/// The controller closed the stream while we waited for an answer, or in
	/// the middle of a line
	UnexpectedEof(String),
	/// Unexpected keyword in an answer (e.g. not VALUE)
	ProtocolViolation(String),
	/// Unknown top-level command
	UnexpectedCommand(String),
	/// No non-empty value and no default for a required setting
	MissingConfig { name: String },
	/// The controller reported an error with ERROR
	Controller(String),
	/// Storage failure that ends the session
	Storage(StorageError),
	/// A handler refused the request after reporting it to the controller
	Rejected(String),
	/// Generic error message
	Other(String),
}

impl fmt::Display for ProtocolError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ProtocolError::Io(e) => write!(f, "I/O error: {}", e),
			ProtocolError::Message(e) => write!(f, "Malformed message: {}", e),
			ProtocolError::UnexpectedEof(msg) => write!(f, "Unexpected end of input: {}", msg),
			ProtocolError::ProtocolViolation(msg) => write!(f, "Protocol violation: {}", msg),
			ProtocolError::UnexpectedCommand(line) => {
				write!(f, "received unexpected message from git-annex: {}", line)
			}
			ProtocolError::MissingConfig { name } => {
				write!(f, "did not receive a non-empty config value for {:?}", name)
			}
			ProtocolError::Controller(msg) => {
				write!(f, "received error message from git-annex: {}", msg)
			}
			ProtocolError::Storage(e) => write!(f, "{}", e),
			ProtocolError::Rejected(msg) => write!(f, "{}", msg),
			ProtocolError::Other(msg) => write!(f, "{}", msg),
		}
	}
}

impl std::error::Error for ProtocolError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			ProtocolError::Io(e) => Some(e),
			ProtocolError::Message(e) => Some(e),
			ProtocolError::Storage(e) => Some(e),
			_ => None,
		}
	}
}

// From implementations for automatic conversion
impl From<io::Error> for ProtocolError {
	fn from(e: io::Error) -> Self {
		ProtocolError::Io(e)
	}
}

impl From<MessageError> for ProtocolError {
	fn from(e: MessageError) -> Self {
		ProtocolError::Message(e)
	}
}

impl From<StorageError> for ProtocolError {
	fn from(e: StorageError) -> Self {
		ProtocolError::Storage(e)
	}
}

impl From<String> for ProtocolError {
	fn from(e: String) -> Self {
		ProtocolError::Other(e)
	}
}

impl From<&str> for ProtocolError {
	fn from(e: &str) -> Self {
		ProtocolError::Other(e.to_string())
	}
}

/// Result type for protocol operations
pub type ProtocolResult<T> = Result<T, ProtocolError>;

// vim: ts=4
