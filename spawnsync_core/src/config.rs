use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::SyncError;
use crate::SyncResult;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["spawnsync.toml", ".spawnsync.toml"];

/// Optional project configuration loaded from `spawnsync.toml`. Command-line
/// arguments always take precedence over values found here; credentials are
/// never read from this file.
///
/// ```toml
/// [inputs]
/// catalog = "pokedex_data.json"
/// spawn_dir = "data/cobblemon/spawn_pool_world"
///
/// [wiki]
/// url = "https://wiki.example.com"
/// namespace = "datapack:spawns"
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
	#[serde(default)]
	pub inputs: InputsConfig,
	#[serde(default)]
	pub wiki: WikiConfig,
}

/// Input paths, relative to the project root.
#[derive(Debug, Default, Deserialize)]
pub struct InputsConfig {
	/// Path to the catalog file.
	#[serde(default)]
	pub catalog: Option<PathBuf>,
	/// Directory containing spawn-definition files.
	#[serde(default)]
	pub spawn_dir: Option<PathBuf>,
}

/// Remote service defaults.
#[derive(Debug, Default, Deserialize)]
pub struct WikiConfig {
	/// Base URL of the wiki.
	#[serde(default)]
	pub url: Option<String>,
	/// Namespace prefix under which all pages are created.
	#[serde(default)]
	pub namespace: Option<String>,
}

impl FileConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if no config file exists.
	pub fn load(root: &Path) -> SyncResult<Option<FileConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config: FileConfig =
			toml::from_str(&content).map_err(|err| SyncError::ConfigParse(err.to_string()))?;

		Ok(Some(config))
	}
}
