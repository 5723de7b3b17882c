/// Integration tests for process configuration loading
/// Files, environment overlay and their effect on the storage delegate
use std::fs;
use tempfile::TempDir;

use annexr::storage::Storage;
use annexr::{Config, SessionOptions};

fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
	pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn test_load_explicit_toml_file() {
	let temp_dir = TempDir::new().expect("Failed to create temp dir");
	let config_path = temp_dir.path().join("annexr.toml");
	fs::write(
		&config_path,
		r#"
logLevel = "debug"

[remotes.backup]
type = "local"
root = "/srv/annex"
"#,
	)
	.expect("Failed to write config file");

	let config = Config::load(Some(config_path.as_path())).expect("Config should load");
	assert_eq!(config.log_level, "debug");
	assert_eq!(config.remotes["backup"].backend, "local");

	let storage = Storage::from_config(&config);
	assert_eq!(storage.list_known_remote_names(), vec!["backup".to_string()]);
}

#[test]
fn test_load_explicit_json_file() {
	let temp_dir = TempDir::new().expect("Failed to create temp dir");
	let config_path = temp_dir.path().join("annexr.json");
	fs::write(&config_path, r#"{"verbose": true, "remotes": {"scratch": {"type": "memory"}}}"#)
		.expect("Failed to write config file");

	let config = Config::from_file(&config_path).expect("Config should load");
	assert!(config.verbose);
	assert!(SessionOptions::from_config(&config).verbose);
	assert!(SessionOptions::from_config(&config).allow_backend_strings);
}

#[test]
fn test_broken_file_is_reported() {
	let temp_dir = TempDir::new().expect("Failed to create temp dir");
	let config_path = temp_dir.path().join("annexr.toml");
	fs::write(&config_path, "remotes = 5\n").expect("Failed to write config file");

	let err = Config::from_file(&config_path).unwrap_err();
	assert!(err.to_string().contains("annexr.toml"));
}

#[test]
fn test_environment_adds_remotes_to_file_config() {
	let temp_dir = TempDir::new().expect("Failed to create temp dir");
	let config_path = temp_dir.path().join("annexr.toml");
	fs::write(&config_path, "[remotes.backup]\ntype = \"local\"\n").expect("Failed to write config file");

	let mut config = Config::from_file(&config_path).unwrap();
	config
		.apply_env(vars(&[
			("ANNEXR_REMOTE_CLOUD_TYPE", "memory"),
			("ANNEXR_REMOTE_CLOUD_ROOT", "bucket"),
			("ANNEXR_ALLOW_BACKEND_STRINGS", "no"),
		]))
		.unwrap();

	assert!(!SessionOptions::from_config(&config).allow_backend_strings);
	let storage = Storage::from_config(&config);
	assert_eq!(storage.list_known_remote_names(), vec!["backup".to_string(), "cloud".to_string()]);
	assert_eq!(storage.remote("cloud").and_then(|r| r.root.as_deref()), Some("bucket"));
}

// vim: ts=4
