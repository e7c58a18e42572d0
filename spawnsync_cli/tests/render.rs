use std::path::Path;

use assert_cmd::Command;
use spawnsync_core::AnyEmptyResult;

fn write_project(root: &Path) -> AnyEmptyResult {
	std::fs::write(
		root.join("pokedex_data.json"),
		r#"{"mewtwo": {"displayName": "Mewtwo", "category": "legendary"}}"#,
	)?;

	let spawn_dir = root.join("data/cobblemon/spawn_pool_world");
	std::fs::create_dir_all(&spawn_dir)?;
	std::fs::write(
		spawn_dir.join("mewtwo.json"),
		r#"{"entityId": "mewtwo", "conditions": [{"structure": "end_city"}], "weight": 1}"#,
	)?;

	Ok(())
}

#[test]
fn render_prints_the_canonical_page() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_project(tmp.path())?;

	let mut cmd = Command::cargo_bin("spawnsync")?;
	cmd.env("NO_COLOR", "1")
		.arg("render")
		.arg("--entity")
		.arg("mewtwo")
		.arg("--provenance")
		.arg("rev9")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("====== Mewtwo ======"))
		.stdout(predicates::str::contains("**Category:** legendary"))
		.stdout(predicates::str::contains("| structure | end_city |"))
		.stdout(predicates::str::contains("Provenance: rev9"));

	Ok(())
}

#[test]
fn render_is_byte_identical_across_runs() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_project(tmp.path())?;

	let mut outputs = Vec::new();
	for _ in 0..2 {
		let mut cmd = Command::cargo_bin("spawnsync")?;
		let assert = cmd
			.env("NO_COLOR", "1")
			.arg("render")
			.arg("--entity")
			.arg("mewtwo")
			.arg("--path")
			.arg(tmp.path())
			.assert()
			.success();
		outputs.push(assert.get_output().stdout.clone());
	}

	assert_eq!(outputs[0], outputs[1]);

	Ok(())
}

#[test]
fn render_unknown_entity_is_an_error() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_project(tmp.path())?;

	let mut cmd = Command::cargo_bin("spawnsync")?;
	cmd.env("NO_COLOR", "1")
		.arg("render")
		.arg("--entity")
		.arg("missingno")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.failure()
		.code(2)
		.stderr(predicates::str::contains("missingno"));

	Ok(())
}
