use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::Deserialize;
use serde::Deserializer;
use serde::de::MapAccess;
use serde::de::Visitor;
use serde_json::Map;
use serde_json::Value;

use crate::SyncError;
use crate::SyncResult;

/// Display metadata for one known entity.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CatalogEntry {
	#[serde(rename = "displayName")]
	pub display_name: String,
	#[serde(default)]
	pub category: Option<String>,
	/// Auxiliary descriptive fields carried through for page headers.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// The reference mapping from entity id to display metadata. Entity ids are
/// unique; duplicates are rejected at load time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
	entries: BTreeMap<String, CatalogEntry>,
}

impl Catalog {
	pub fn get(&self, entity_id: &str) -> Option<&CatalogEntry> {
		self.entries.get(entity_id)
	}

	pub fn contains(&self, entity_id: &str) -> bool {
		self.entries.contains_key(entity_id)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&String, &CatalogEntry)> {
		self.entries.iter()
	}

	#[cfg(test)]
	pub(crate) fn from_entries(entries: BTreeMap<String, CatalogEntry>) -> Self {
		Self { entries }
	}
}

/// Catalog entries as they appear in the file, duplicates included. Serde's
/// map handling would silently last-write-win on duplicate keys, which must
/// instead be a load-time failure, so the pairs are collected verbatim and
/// checked afterwards.
struct RawEntries(Vec<(String, CatalogEntry)>);

impl<'de> Deserialize<'de> for RawEntries {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		struct RawEntriesVisitor;

		impl<'de> Visitor<'de> for RawEntriesVisitor {
			type Value = RawEntries;

			fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
				formatter.write_str("a map of entity ids to catalog entries")
			}

			fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
			where
				A: MapAccess<'de>,
			{
				let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
				while let Some((key, value)) = map.next_entry::<String, CatalogEntry>()? {
					pairs.push((key, value));
				}
				Ok(RawEntries(pairs))
			}
		}

		deserializer.deserialize_map(RawEntriesVisitor)
	}
}

/// Load the catalog from a single JSON file.
///
/// The catalog is a singular required input with no partial-success mode: a
/// missing or unparseable file is fatal, and so is a duplicate entity id.
pub fn load_catalog(path: &Path) -> SyncResult<Catalog> {
	let raw = std::fs::read_to_string(path).map_err(|err| SyncError::CatalogRead {
		path: path.display().to_string(),
		reason: err.to_string(),
	})?;

	let RawEntries(pairs) = serde_json::from_str(&raw).map_err(|err| SyncError::CatalogParse {
		path: path.display().to_string(),
		reason: err.to_string(),
	})?;

	let mut entries = BTreeMap::new();
	for (entity_id, entry) in pairs {
		if entries.insert(entity_id.clone(), entry).is_some() {
			return Err(SyncError::DuplicateCatalogEntry {
				entity: entity_id,
				path: path.display().to_string(),
			});
		}
	}

	Ok(Catalog { entries })
}
