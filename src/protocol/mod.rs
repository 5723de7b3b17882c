//! git-annex external special remote protocol
//!
//! A [`Session`] owns the controller's stream pair. The handlers translate
//! each command into operations on [`crate::storage::Storage`].
//!
//! # Example Usage
//!
//! ```ignore
//! use annexr::protocol::{Session, SessionOptions};
//!
//! let reader = tokio::io::BufReader::new(tokio::io::stdin());
//! let mut session = Session::new(reader, tokio::io::stdout(), storage, SessionOptions::default());
//! session.run().await?;
//! ```

pub mod configs;
pub mod error;
pub mod handlers;
pub mod layout;
pub mod message;
pub mod negotiation;
pub mod session;

// Re-export public API
pub use configs::{required_configs, ConfigDefinition, ConfigField, RemoteSettings};
pub use error::{ProtocolError, ProtocolResult};
pub use handlers::TransferDirection;
pub use layout::{build_locator, ControllerQuery, LayoutMode};
pub use message::{Message, MessageError};
pub use negotiation::Extensions;
pub use session::{Session, SessionOptions, SessionState};

// vim: ts=4
