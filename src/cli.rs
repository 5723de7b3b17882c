//! Command line definition
//!
//! git-annex looks for a program named `git-annex-remote-<type>`. When the
//! binary is invoked under that name it behaves as `annexr gitannex`.

use clap::{Arg, ArgAction, Command};
use std::ffi::{OsStr, OsString};
use std::path::Path;

/// Program name git-annex invokes for `externaltype=annexr`
pub const UNIQUE_COMMAND_NAME: &str = "git-annex-remote-annexr";

/// Name of the serving subcommand
pub const GITANNEX_COMMAND: &str = "gitannex";

/// Long help of the serving subcommand
pub const GITANNEX_HELP: &str = include_str!("gitannex.md");

pub fn command() -> Command {
	Command::new("annexr")
		.version(env!("CARGO_PKG_VERSION"))
		.author("Szilard Hajba <szilard@symbion.hu>")
		.about("git-annex special remote backed by annexr storage")
		.subcommand_required(true)
		.arg(
			Arg::new("config")
				.short('c')
				.long("config")
				.value_name("PATH")
				.global(true)
				.help("Configuration file (TOML, or JSON with a .json extension)"),
		)
		.arg(
			Arg::new("verbose")
				.short('v')
				.long("verbose")
				.action(ArgAction::SetTrue)
				.global(true)
				.help("Log every protocol message to stderr"),
		)
		.subcommand(
			Command::new(GITANNEX_COMMAND)
				.about("Speak with git-annex over stdin/stdout")
				.long_about(GITANNEX_HELP),
		)
		.subcommand(Command::new("remotes").about("List configured remotes"))
		.subcommand(Command::new("backends").about("List available storage backends"))
}

/// Rewrite `git-annex-remote-annexr [args...]` to `annexr gitannex [args...]`
///
/// Any other invocation is returned unchanged.
pub fn maybe_transform_args(args: Vec<OsString>) -> Vec<OsString> {
	let invoked_as = match args.first() {
		Some(arg0) => Path::new(arg0).file_name().map(|name| name.to_os_string()),
		None => None,
	};
	if invoked_as.as_deref() != Some(OsStr::new(UNIQUE_COMMAND_NAME)) {
		return args;
	}

	let mut transformed = Vec::with_capacity(args.len() + 1);
	transformed.push(OsString::from("annexr"));
	transformed.push(OsString::from(GITANNEX_COMMAND));
	transformed.extend(args.into_iter().skip(1));
	transformed
}


// vim: ts=4
