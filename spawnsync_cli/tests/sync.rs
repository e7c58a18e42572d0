use std::io::Read;
use std::io::Write;
use std::net::TcpListener;
use std::net::TcpStream;
use std::path::Path;
use std::thread;

use assert_cmd::Command;
use spawnsync_core::AnyEmptyResult;

const CATALOG: &str = r#"{
	"bulbasaur": {"displayName": "Bulbasaur", "category": "starter"},
	"mewtwo": {"displayName": "Mewtwo", "category": "legendary"}
}"#;

fn write_project(root: &Path) -> AnyEmptyResult {
	std::fs::write(root.join("pokedex_data.json"), CATALOG)?;

	let spawn_dir = root.join("data/cobblemon/spawn_pool_world");
	std::fs::create_dir_all(&spawn_dir)?;
	std::fs::write(
		spawn_dir.join("bulbasaur.json"),
		r#"{"entityId": "bulbasaur", "conditions": [{"biome": "plains"}], "weight": 4}"#,
	)?;
	std::fs::write(
		spawn_dir.join("mewtwo.json"),
		r#"[{"entityId": "mewtwo", "conditions": [{"structure": "end_city"}]}]"#,
	)?;

	Ok(())
}

#[test]
fn dry_run_lists_every_page() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_project(tmp.path())?;

	let mut cmd = Command::cargo_bin("spawnsync")?;
	cmd.env("NO_COLOR", "1")
		.arg("sync")
		.arg("--dry-run")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Dry run: 2 page(s)"))
		.stdout(predicates::str::contains("spawn-info:bulbasaur"))
		.stdout(predicates::str::contains("spawn-info:mewtwo"));

	Ok(())
}

#[test]
fn dry_run_warns_about_uncatalogued_entities() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_project(tmp.path())?;
	std::fs::write(
		tmp.path()
			.join("data/cobblemon/spawn_pool_world/ghost.json"),
		r#"{"entityId": "missingno"}"#,
	)?;

	let mut cmd = Command::cargo_bin("spawnsync")?;
	cmd.env("NO_COLOR", "1")
		.arg("sync")
		.arg("--dry-run")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Dry run: 2 page(s)"))
		.stderr(predicates::str::contains("has no catalog entry"));

	Ok(())
}

#[test]
fn missing_catalog_is_fatal() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_project(tmp.path())?;
	std::fs::remove_file(tmp.path().join("pokedex_data.json"))?;

	let mut cmd = Command::cargo_bin("spawnsync")?;
	cmd.env("NO_COLOR", "1")
		.arg("sync")
		.arg("--dry-run")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.failure()
		.code(2)
		.stderr(predicates::str::contains("catalog"));

	Ok(())
}

#[test]
fn duplicate_catalog_keys_are_fatal() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_project(tmp.path())?;
	std::fs::write(
		tmp.path().join("pokedex_data.json"),
		r#"{"mew": {"displayName": "Mew"}, "mew": {"displayName": "Mew Again"}}"#,
	)?;

	let mut cmd = Command::cargo_bin("spawnsync")?;
	cmd.env("NO_COLOR", "1")
		.arg("sync")
		.arg("--dry-run")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.failure()
		.code(2)
		.stderr(predicates::str::contains("duplicate entity id `mew`"));

	Ok(())
}

#[test]
fn empty_spawn_directory_is_fatal() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_project(tmp.path())?;
	let spawn_dir = tmp.path().join("data/cobblemon/spawn_pool_world");
	std::fs::remove_dir_all(&spawn_dir)?;
	std::fs::create_dir_all(&spawn_dir)?;

	let mut cmd = Command::cargo_bin("spawnsync")?;
	cmd.env("NO_COLOR", "1")
		.arg("sync")
		.arg("--dry-run")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.failure()
		.code(2)
		.stderr(predicates::str::contains("no usable spawn files"));

	Ok(())
}

#[test]
fn config_file_supplies_input_paths() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("dex.json"), CATALOG)?;
	std::fs::create_dir(tmp.path().join("spawns"))?;
	std::fs::write(
		tmp.path().join("spawns/all.json"),
		r#"[{"entityId": "bulbasaur"}]"#,
	)?;
	std::fs::write(
		tmp.path().join("spawnsync.toml"),
		"[inputs]\ncatalog = \"dex.json\"\nspawn_dir = \"spawns\"\n\n[wiki]\nnamespace = \
		 \"wiki-spawns\"\n",
	)?;

	let mut cmd = Command::cargo_bin("spawnsync")?;
	cmd.env("NO_COLOR", "1")
		.arg("sync")
		.arg("--dry-run")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("wiki-spawns:bulbasaur"));

	Ok(())
}

#[test]
fn sync_without_url_is_an_error() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_project(tmp.path())?;

	let mut cmd = Command::cargo_bin("spawnsync")?;
	cmd.env("NO_COLOR", "1")
		.env_remove("SPAWNSYNC_URL")
		.arg("sync")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.failure()
		.code(2)
		.stderr(predicates::str::contains("no wiki URL configured"));

	Ok(())
}

#[test]
fn write_failure_exits_nonzero_after_attempting_all_pages() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_project(tmp.path())?;
	let port = spawn_stub_wiki("mewtwo")?;

	let mut cmd = Command::cargo_bin("spawnsync")?;
	cmd.env("NO_COLOR", "1")
		.arg("sync")
		.arg("--url")
		.arg(format!("http://127.0.0.1:{port}"))
		.arg("--user")
		.arg("bot")
		.arg("--password")
		.arg("secret")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.failure()
		.code(1)
		.stdout(predicates::str::contains("created spawn-info:bulbasaur"))
		.stdout(predicates::str::contains("failed spawn-info:mewtwo"))
		.stdout(predicates::str::contains("1 written, 0 unchanged, 1 failed."));

	Ok(())
}

/// Minimal XML-RPC wiki over a raw TCP socket: answers the version probe,
/// reports every page as missing, accepts every write except the one whose
/// request body mentions `fail_page`.
fn spawn_stub_wiki(fail_page: &'static str) -> std::io::Result<u16> {
	let listener = TcpListener::bind("127.0.0.1:0")?;
	let port = listener.local_addr()?.port();

	thread::spawn(move || {
		for stream in listener.incoming() {
			let Ok(mut stream) = stream else { continue };
			let Ok(request) = read_http_request(&mut stream) else {
				continue;
			};

			let body = if request.contains("dokuwiki.getVersion") {
				string_response("Release 2024-02-06a")
			} else if request.contains("wiki.getPage") {
				fault_response(100, "The requested page does not exist")
			} else if request.contains(fail_page) {
				fault_response(111, "You are not allowed to edit this page")
			} else {
				string_response("")
			};

			let response = format!(
				"HTTP/1.1 200 OK\r\nContent-Type: text/xml\r\nContent-Length: \
				 {}\r\nConnection: close\r\n\r\n{body}",
				body.len()
			);
			let _ = stream.write_all(response.as_bytes());
		}
	});

	Ok(port)
}

/// Read one HTTP request: headers, then as many body bytes as Content-Length
/// announces.
fn read_http_request(stream: &mut TcpStream) -> std::io::Result<String> {
	let mut data = Vec::new();
	let mut buf = [0u8; 4096];

	loop {
		let n = stream.read(&mut buf)?;
		if n == 0 {
			break;
		}
		data.extend_from_slice(&buf[..n]);

		let Some(header_end) = data.windows(4).position(|w| w == b"\r\n\r\n") else {
			continue;
		};
		let headers = String::from_utf8_lossy(&data[..header_end]).to_lowercase();
		let content_length = headers
			.lines()
			.find_map(|line| line.strip_prefix("content-length:"))
			.and_then(|value| value.trim().parse::<usize>().ok())
			.unwrap_or(0);
		if data.len() >= header_end + 4 + content_length {
			break;
		}
	}

	Ok(String::from_utf8_lossy(&data).into_owned())
}

fn string_response(text: &str) -> String {
	format!(
		"<?xml version=\"1.0\"?><methodResponse><params><param><value><string>{text}</string>\
		 </value></param></params></methodResponse>"
	)
}

fn fault_response(code: i32, message: &str) -> String {
	format!(
		"<?xml version=\"1.0\"?><methodResponse><fault><value><struct><member><name>faultCode\
		 </name><value><int>{code}</int></value></member><member><name>faultString</name><value>\
		 <string>{message}</string></value></member></struct></value></fault></methodResponse>"
	)
}

#[test]
fn no_subcommand_prints_usage_hint() -> AnyEmptyResult {
	let mut cmd = Command::cargo_bin("spawnsync")?;
	cmd.env("NO_COLOR", "1")
		.assert()
		.failure()
		.code(1)
		.stderr(predicates::str::contains("No subcommand specified"));

	Ok(())
}
