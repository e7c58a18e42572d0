use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde_json::Map;
use serde_json::Value;
use tracing::warn;

use crate::SyncError;
use crate::SyncResult;

/// One spawn rule as it appears in a spawn-definition file.
///
/// The engine interprets nothing beyond `entityId`, `conditions`, and
/// `enabled`. Every other top-level field (`spawnBucket`, `weight`, `level`,
/// `context`, presets, and whatever future tuning knobs the datapack grows)
/// is carried through opaquely in `extra` and rendered as-is.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SpawnRecord {
	#[serde(rename = "entityId")]
	pub entity_id: String,
	/// Ordered condition clauses. Each clause is an opaque key-value mapping
	/// passed through to page rendering without interpretation.
	#[serde(default)]
	pub conditions: Vec<Map<String, Value>>,
	/// Disabled records are dropped at load time.
	#[serde(default = "default_enabled")]
	pub enabled: bool,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

fn default_enabled() -> bool {
	true
}

/// A spawn file holds either a single record object or an array of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SpawnFile {
	Many(Vec<SpawnRecord>),
	One(SpawnRecord),
}

impl SpawnFile {
	fn into_records(self) -> Vec<SpawnRecord> {
		match self {
			Self::Many(records) => records,
			Self::One(record) => vec![record],
		}
	}
}

/// A record together with its provenance within the input tree. Source file
/// path (sorted) and in-file index define the stable render order.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedRecord {
	pub record: SpawnRecord,
	pub file: PathBuf,
	pub index: usize,
}

/// A recoverable problem encountered while loading spawn files.
#[derive(Debug, Clone)]
pub enum LoadWarning {
	/// A file could not be parsed as spawn data and was excluded.
	FileSkipped { file: PathBuf, reason: String },
	/// A record had no usable `entityId` and was excluded.
	MissingEntityId { file: PathBuf, index: usize },
	/// A record was explicitly disabled and excluded.
	DisabledRecord {
		file: PathBuf,
		index: usize,
		entity_id: String,
	},
}

impl LoadWarning {
	/// Human-readable message for this warning.
	pub fn message(&self) -> String {
		match self {
			Self::FileSkipped { file, reason } => {
				format!("skipped `{}`: {reason}", file.display())
			}
			Self::MissingEntityId { file, index } => {
				format!(
					"record #{} in `{}` has no entityId",
					index + 1,
					file.display()
				)
			}
			Self::DisabledRecord {
				file,
				index,
				entity_id,
			} => {
				format!(
					"record #{} (`{entity_id}`) in `{}` is disabled",
					index + 1,
					file.display()
				)
			}
		}
	}
}

/// All records loaded from a spawn directory plus the warnings collected on
/// the way.
#[derive(Debug, Default)]
pub struct RecordSet {
	pub records: Vec<LoadedRecord>,
	pub warnings: Vec<LoadWarning>,
}

/// Load every spawn-definition file under `dir`.
///
/// Only `*.json` files are considered; anything else is ignored silently.
/// Files are visited in sorted path order so re-runs over unchanged inputs
/// observe records in the same order. A file that fails to parse is reported
/// and excluded; loading is fatal only when no file parses at all.
pub fn load_spawn_dir(dir: &Path) -> SyncResult<RecordSet> {
	if !dir.is_dir() {
		return Err(SyncError::SpawnDirMissing {
			path: dir.display().to_string(),
		});
	}

	let files = collect_spawn_files(dir)?;
	let mut set = RecordSet::default();
	let mut parsed_files = 0usize;

	for file in files {
		let raw = match std::fs::read_to_string(&file) {
			Ok(raw) => raw,
			Err(err) => {
				push_warning(
					&mut set,
					LoadWarning::FileSkipped {
						file,
						reason: err.to_string(),
					},
				);
				continue;
			}
		};

		let parsed: SpawnFile = match serde_json::from_str(&raw) {
			Ok(parsed) => parsed,
			Err(err) => {
				push_warning(
					&mut set,
					LoadWarning::FileSkipped {
						file,
						reason: err.to_string(),
					},
				);
				continue;
			}
		};
		parsed_files += 1;

		for (index, record) in parsed.into_records().into_iter().enumerate() {
			if !record.enabled {
				push_warning(
					&mut set,
					LoadWarning::DisabledRecord {
						file: file.clone(),
						index,
						entity_id: record.entity_id.clone(),
					},
				);
				continue;
			}
			if record.entity_id.trim().is_empty() {
				push_warning(
					&mut set,
					LoadWarning::MissingEntityId {
						file: file.clone(),
						index,
					},
				);
				continue;
			}
			set.records.push(LoadedRecord {
				record,
				file: file.clone(),
				index,
			});
		}
	}

	if parsed_files == 0 {
		return Err(SyncError::NoSpawnRecords {
			path: dir.display().to_string(),
		});
	}

	Ok(set)
}

fn push_warning(set: &mut RecordSet, warning: LoadWarning) {
	warn!("{}", warning.message());
	set.warnings.push(warning);
}

/// Collect all spawn files from a directory tree, sorted for deterministic
/// ordering.
fn collect_spawn_files(root: &Path) -> SyncResult<Vec<PathBuf>> {
	let mut files = Vec::new();
	let mut visited_dirs = HashSet::new();
	walk_dir(root, &mut files, &mut visited_dirs)?;
	files.sort();
	Ok(files)
}

fn walk_dir(
	dir: &Path,
	files: &mut Vec<PathBuf>,
	visited_dirs: &mut HashSet<PathBuf>,
) -> SyncResult<()> {
	// Detect symlink cycles by tracking canonical paths.
	let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
	if !visited_dirs.insert(canonical) {
		warn!("skipping already-visited directory `{}`", dir.display());
		return Ok(());
	}

	let entries = std::fs::read_dir(dir)?;

	for entry in entries {
		let entry = entry?;
		let path = entry.path();

		// Skip hidden entries.
		if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
			if name.starts_with('.') {
				continue;
			}
		}

		if path.is_dir() {
			walk_dir(&path, files, visited_dirs)?;
		} else if is_spawn_file(&path) {
			files.push(path);
		}
	}

	Ok(())
}

/// Check if a file should be considered spawn data.
fn is_spawn_file(path: &Path) -> bool {
	path.extension().and_then(|e| e.to_str()) == Some("json")
}
