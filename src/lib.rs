//! # annexr - git-annex external special remote
//!
//! annexr implements the remote side of git-annex's external special remote
//! protocol and stores annexed content in pluggable storage backends.
//!
//! ## Setup
//!
//! ```bash
//! ln -s "$(which annexr)" ~/bin/git-annex-remote-annexr
//! git annex initremote MyRemote type=external externaltype=annexr \
//!     encryption=none rcloneremotename=backup
//! ```
//!
//! ## Embedding
//!
//! ```rust,ignore
//! use annexr::{serve::serve_streams, Storage, SessionOptions};
//!
//! let storage = std::sync::Arc::new(Storage::new(Default::default()));
//! serve_streams(reader, writer, storage, SessionOptions::default()).await?;
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod serve;
pub mod storage;

// Re-export commonly used types
pub use config::{Config, RemoteDefinition};
pub use error::AppError;
pub use protocol::{ProtocolError, Session, SessionOptions};
pub use storage::{Storage, StorageError};

// vim: ts=4
