use std::collections::BTreeMap;
use std::path::PathBuf;

use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use crate::catalog::Catalog;
use crate::catalog::CatalogEntry;
use crate::records::LoadedRecord;
use crate::records::SpawnRecord;
use crate::render::PageDocument;
use crate::store::MemoryPageStore;
use crate::store::PageStore;
use crate::store::StoreError;

pub(crate) fn obj(value: Value) -> Map<String, Value> {
	match value {
		Value::Object(map) => map,
		other => panic!("fixture expected a JSON object, got {other}"),
	}
}

pub(crate) fn catalog_entry(display_name: &str, category: Option<&str>) -> CatalogEntry {
	CatalogEntry {
		display_name: display_name.to_string(),
		category: category.map(str::to_string),
		extra: Map::new(),
	}
}

pub(crate) fn catalog(entries: &[(&str, &str)]) -> Catalog {
	let entries: BTreeMap<String, CatalogEntry> = entries
		.iter()
		.map(|(id, display)| ((*id).to_string(), catalog_entry(display, None)))
		.collect();
	Catalog::from_entries(entries)
}

pub(crate) fn spawn_record(entity_id: &str, conditions: Vec<Value>, extra: Value) -> SpawnRecord {
	SpawnRecord {
		entity_id: entity_id.to_string(),
		conditions: conditions.into_iter().map(obj).collect(),
		enabled: true,
		extra: obj(extra),
	}
}

pub(crate) fn loaded_record(
	entity_id: &str,
	file: &str,
	index: usize,
	conditions: Vec<Value>,
) -> LoadedRecord {
	LoadedRecord {
		record: spawn_record(entity_id, conditions, json!({})),
		file: PathBuf::from(file),
		index,
	}
}

pub(crate) fn page(entity_id: &str, content: &str) -> PageDocument {
	PageDocument {
		page_id: format!("ns:{entity_id}"),
		entity_id: entity_id.to_string(),
		content: content.to_string(),
	}
}

/// A store whose `put` fails for one specific page id.
pub(crate) struct FailingPutStore {
	pub inner: MemoryPageStore,
	pub fail_on: String,
	pub error: StoreError,
}

impl PageStore for FailingPutStore {
	fn get(&self, page_id: &str) -> Result<Option<String>, StoreError> {
		self.inner.get(page_id)
	}

	fn put(&self, page_id: &str, content: &str, summary: &str) -> Result<(), StoreError> {
		if page_id == self.fail_on {
			return Err(self.error.clone());
		}
		self.inner.put(page_id, content, summary)
	}
}

/// A store whose `get` fails for one specific page id.
pub(crate) struct FailingGetStore {
	pub inner: MemoryPageStore,
	pub fail_on: String,
	pub error: StoreError,
}

impl PageStore for FailingGetStore {
	fn get(&self, page_id: &str) -> Result<Option<String>, StoreError> {
		if page_id == self.fail_on {
			return Err(self.error.clone());
		}
		self.inner.get(page_id)
	}

	fn put(&self, page_id: &str, content: &str, summary: &str) -> Result<(), StoreError> {
		self.inner.put(page_id, content, summary)
	}
}
