//! TRANSFER between local files and remotes, on disk and in memory

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::BufReader;

use annexr::protocol::{ProtocolError, Session, SessionOptions};
use annexr::storage::local::TEMP_SUFFIX;
use annexr::storage::Storage;
use annexr::RemoteDefinition;

const GETCONFIGS: &str = "GETCONFIG rcloneremotename\nGETCONFIG rcloneprefix\nGETCONFIG rclonelayout\n";

fn storage() -> Arc<Storage> {
	let mut remotes = BTreeMap::new();
	remotes.insert("mem".to_string(), RemoteDefinition::new("memory", Some("bucket")));
	Arc::new(Storage::new(remotes))
}

fn configs(remote: &str, prefix: &str, layout: &str) -> String {
	format!("VALUE {}\nVALUE {}\nVALUE {}\n", remote, prefix, layout)
}

async fn run(storage: Arc<Storage>, input: &str) -> (Result<(), ProtocolError>, String) {
	let mut session =
		Session::new(BufReader::new(input.as_bytes()), Vec::new(), storage, SessionOptions::default());
	let result = session.run().await;
	let (_, output) = session.into_parts();
	(result, String::from_utf8(output).unwrap())
}

fn last_line(output: &str) -> &str {
	output.lines().last().unwrap_or("")
}

fn path_str(path: &Path) -> String {
	path.to_str().unwrap().to_string()
}

/// Work directory (local files) and remote directory inside one TempDir
fn dirs() -> (TempDir, String, String) {
	let temp = TempDir::new().unwrap();
	let work = temp.path().join("work dir");
	let remote = temp.path().join("remote");
	fs::create_dir_all(&work).unwrap();
	fs::create_dir_all(&remote).unwrap();
	(temp, path_str(&work), path_str(&remote))
}

// ============================================================================
// Local backend
// ============================================================================

#[tokio::test]
async fn test_store_then_retrieve_on_disk() {
	let (_temp, work, remote) = dirs();
	let src = Path::new(&work).join("file with spaces.txt");
	fs::write(&src, b"annexed content").unwrap();
	let dst = Path::new(&work).join("copy.txt");

	let input = format!(
		"TRANSFER STORE KEY1 {}\n{}TRANSFER RETRIEVE KEY1 {}\nCHECKPRESENT KEY1\n",
		path_str(&src),
		configs(":local:", &remote, "nodir"),
		path_str(&dst)
	);
	let (result, output) = run(storage(), &input).await;
	assert!(result.is_ok(), "{:?}", result);
	assert_eq!(
		output,
		format!(
			"VERSION 1\n{}TRANSFER-SUCCESS STORE KEY1\nTRANSFER-SUCCESS RETRIEVE KEY1\nCHECKPRESENT-SUCCESS KEY1\n",
			GETCONFIGS
		)
	);

	assert_eq!(fs::read(Path::new(&remote).join("KEY1")).unwrap(), b"annexed content");
	assert_eq!(fs::read(&dst).unwrap(), b"annexed content");

	// No temporary files left behind
	for entry in fs::read_dir(&remote).unwrap() {
		let name = entry.unwrap().file_name().to_string_lossy().into_owned();
		assert!(!name.ends_with(TEMP_SUFFIX), "leftover {}", name);
	}
}

#[tokio::test]
async fn test_store_overwrites() {
	let (_temp, work, remote) = dirs();
	fs::write(Path::new(&remote).join("KEY1"), b"old").unwrap();
	let src = Path::new(&work).join("f");
	fs::write(&src, b"new").unwrap();

	let input = format!("TRANSFER STORE KEY1 {}\n{}", path_str(&src), configs(":local:", &remote, "nodir"));
	let (result, _) = run(storage(), &input).await;
	assert!(result.is_ok());
	assert_eq!(fs::read(Path::new(&remote).join("KEY1")).unwrap(), b"new");
}

#[tokio::test]
async fn test_retrieve_missing_key_keeps_session() {
	let (_temp, work, remote) = dirs();
	let dst = Path::new(&work).join("out");

	let input = format!(
		"TRANSFER RETRIEVE KEY9 {}\n{}GETCOST\n",
		path_str(&dst),
		configs(":local:", &remote, "nodir")
	);
	let (result, output) = run(storage(), &input).await;
	assert!(result.is_ok());
	assert!(output.ends_with("TRANSFER-FAILURE RETRIEVE KEY9 not found\nCOST 200\n"));
	assert!(!dst.exists());
}

#[tokio::test]
async fn test_store_missing_local_file() {
	let (_temp, work, remote) = dirs();
	let src = Path::new(&work).join("absent");

	let input = format!("TRANSFER STORE KEY1 {}\n{}", path_str(&src), configs(":local:", &remote, "nodir"));
	let (result, output) = run(storage(), &input).await;
	assert!(matches!(result, Err(ProtocolError::Storage(_))));
	assert!(last_line(&output).starts_with("TRANSFER-FAILURE STORE KEY1 failed to copy file: "));
	assert!(!Path::new(&remote).join("KEY1").exists());
}

// ============================================================================
// Layouts (memory backend)
// ============================================================================

#[tokio::test]
async fn test_store_with_hashed_layouts() {
	let cases = [
		("lower", "f87/4d5/", "DIRHASH-LOWER KEY1", "bucket/annex/f87/4d5/KEY1"),
		("directory", "f87/4d5/", "DIRHASH-LOWER KEY1", "bucket/annex/f87/4d5/KEY1/KEY1"),
		("mixed", "Xx/Yy/", "DIRHASH KEY1", "bucket/annex/Xx/Yy/KEY1"),
		("frankencase", "Xx/Yy/", "DIRHASH KEY1", "bucket/annex/xx/yy/KEY1"),
		("nodir", "", "", "bucket/annex/KEY1"),
	];

	for (layout, dirhash, query, stored_at) in cases.iter() {
		let (_temp, work, _remote) = dirs();
		let src = Path::new(&work).join("f");
		fs::write(&src, b"data").unwrap();

		let storage = storage();
		let mut input = format!("TRANSFER STORE KEY1 {}\n{}", path_str(&src), configs("mem", "annex", layout));
		let mut expected = format!("VERSION 1\n{}", GETCONFIGS);
		if !query.is_empty() {
			input.push_str(&format!("VALUE {}\n", dirhash));
			expected.push_str(&format!("{}\n", query));
		}
		expected.push_str("TRANSFER-SUCCESS STORE KEY1\n");

		let (result, output) = run(Arc::clone(&storage), &input).await;
		assert!(result.is_ok(), "layout {}: {:?}", layout, result);
		assert_eq!(output, expected, "layout {}", layout);
		assert_eq!(storage.memory().paths().await, vec![stored_at.to_string()], "layout {}", layout);
	}
}

// ============================================================================
// Malformed requests
// ============================================================================

#[tokio::test]
async fn test_malformed_transfer_requests() {
	let cases = [
		("TRANSFER\n", "TRANSFER-FAILURE failed to parse direction"),
		("TRANSFER STORE\n", "TRANSFER-FAILURE failed to parse key"),
		("TRANSFER STORE KEY1\n", "TRANSFER-FAILURE failed to parse file path"),
		("TRANSFER MOVE KEY1 /tmp/x\n", "TRANSFER-FAILURE MOVE KEY1 unrecognized mode"),
	];
	for (input, expected) in cases.iter() {
		let (result, output) = run(storage(), input).await;
		assert!(result.is_err(), "input {:?}", input);
		// Rejected before any configuration is fetched
		assert_eq!(output, format!("VERSION 1\n{}\n", expected));
	}
}

#[tokio::test]
async fn test_transfer_config_failure_echoes_mode_and_key() {
	let (result, output) = run(storage(), "TRANSFER STORE KEY1 /tmp/x\nVALUE \nVALUE \n").await;
	assert!(matches!(result, Err(ProtocolError::MissingConfig { .. })));
	assert_eq!(last_line(&output), "TRANSFER-FAILURE STORE KEY1 failed to get configs");
}

#[tokio::test]
async fn test_transfer_unknown_remote() {
	let input = format!("TRANSFER STORE KEY1 /tmp/x\n{}", configs("nowhere", "annex", "nodir"));
	let (result, output) = run(storage(), &input).await;
	assert!(result.is_err());
	assert_eq!(last_line(&output), "TRANSFER-FAILURE STORE KEY1 failed to get remote fs");
}

// vim: ts=4
