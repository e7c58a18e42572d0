use miette::Diagnostic;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum SyncError {
	#[error(transparent)]
	#[diagnostic(code(spawnsync::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to read catalog file `{path}`: {reason}")]
	#[diagnostic(
		code(spawnsync::catalog_read),
		help("the catalog is a required input; check the --catalog path")
	)]
	CatalogRead { path: String, reason: String },

	#[error("failed to parse catalog file `{path}`: {reason}")]
	#[diagnostic(
		code(spawnsync::catalog_parse),
		help("the catalog must be a JSON object mapping entity ids to entries with a `displayName`")
	)]
	CatalogParse { path: String, reason: String },

	#[error("duplicate entity id `{entity}` in catalog `{path}`")]
	#[diagnostic(
		code(spawnsync::duplicate_catalog_entry),
		help("each entity id may appear only once; remove the duplicate entry")
	)]
	DuplicateCatalogEntry { entity: String, path: String },

	#[error("spawn directory not found: `{path}`")]
	#[diagnostic(code(spawnsync::spawn_dir_missing))]
	SpawnDirMissing { path: String },

	#[error("no usable spawn files found under `{path}`")]
	#[diagnostic(
		code(spawnsync::no_spawn_records),
		help("the directory must contain at least one parseable *.json spawn file")
	)]
	NoSpawnRecords { path: String },

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(spawnsync::config_parse),
		help("check that spawnsync.toml is valid TOML with [inputs] and/or [wiki] sections")
	)]
	ConfigParse(String),

	#[error("unknown entity `{0}`")]
	#[diagnostic(
		code(spawnsync::unknown_entity),
		help("the entity has no catalog entry, so no page can be rendered for it")
	)]
	UnknownEntity(String),

	#[error(transparent)]
	#[diagnostic(code(spawnsync::remote))]
	Remote(#[from] StoreError),
}

pub type SyncResult<T> = Result<T, SyncError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
