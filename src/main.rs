use std::env;
use std::error::Error;
use std::path::Path;

use annexr::cli;
use annexr::config::Config;
use annexr::error::AppError;
use annexr::logging::{self, *};
use annexr::serve;
use annexr::storage::Storage;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
	let args = cli::maybe_transform_args(env::args_os().collect());
	let matches = cli::command().get_matches_from(args);

	let mut config = Config::load(matches.get_one::<String>("config").map(Path::new))?;
	if matches.get_flag("verbose") {
		config.verbose = true;
	}

	// The transcript is logged at info; make sure it shows up
	if config.verbose {
		logging::init_tracing(&format!("{},annexr=info", config.log_level));
	} else {
		logging::init_tracing(&config.log_level);
	}
	debug!("Configuration: {:?}", config);

	match matches.subcommand_name() {
		Some(cli::GITANNEX_COMMAND) => serve::serve(&config).await?,
		Some("remotes") => {
			let storage = Storage::from_config(&config);
			for name in storage.list_known_remote_names() {
				if let Some(remote) = storage.remote(&name) {
					println!("{}: {} {}", name, remote.backend, remote.root.as_deref().unwrap_or(""));
				}
			}
		}
		Some("backends") => {
			let storage = Storage::from_config(&config);
			for backend in storage.backends() {
				println!("{:<10} {}", backend.name, backend.description);
			}
		}
		other => {
			return Err(AppError::Usage { message: format!("unknown subcommand: {:?}", other) }.into())
		}
	}

	Ok(())
}

// vim: ts=4
