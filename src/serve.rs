//! Serving mode: one protocol session on stdin/stdout
//!
//! git-annex starts the remote program and talks to it over its standard
//! streams. Everything else (logs, diagnostics) goes to stderr.

use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncWrite};

use crate::config::Config;
use crate::error::AppError;
use crate::logging::*;
use crate::protocol::{Session, SessionOptions};
use crate::storage::Storage;

/// Serve git-annex on the process's standard streams until it hangs up
pub async fn serve(config: &Config) -> Result<(), AppError> {
	let storage = Arc::new(Storage::from_config(config));
	debug!("[serve] {:?}", storage);

	let reader = tokio::io::BufReader::new(tokio::io::stdin());
	let writer = tokio::io::stdout();
	serve_streams(reader, writer, storage, SessionOptions::from_config(config)).await
}

/// Run one session over the given streams
///
/// When the session fails the controller is sent `ERROR <reason>` (if it
/// still listens) and the failure is returned.
pub async fn serve_streams<R, W>(
	reader: R,
	writer: W,
	storage: Arc<Storage>,
	options: SessionOptions,
) -> Result<(), AppError>
where
	R: AsyncBufRead + Unpin,
	W: AsyncWrite + Unpin,
{
	let mut session = Session::new(reader, writer, storage, options);

	match session.run().await {
		Ok(()) => {
			info!("git-annex closed the connection");
			Ok(())
		}
		Err(e) => {
			error!("Session failed: {}", e);
			if let Err(send_err) = session.send_error(&e).await {
				warn!("Could not report the error to git-annex: {}", send_err);
			}
			Err(AppError::Protocol(e))
		}
	}
}


// vim: ts=4
