use std::collections::BTreeMap;
use std::path::PathBuf;

use serde_json::Value;
use tracing::warn;

use crate::catalog::Catalog;
use crate::catalog::CatalogEntry;
use crate::records::LoadedRecord;

/// The derived, canonical output for one entity: the page it maps to and the
/// full rendered text. Computed fresh every run; it has no persisted identity
/// beyond the remote page keyed by `page_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDocument {
	pub page_id: String,
	pub entity_id: String,
	pub content: String,
}

/// A data-integrity problem found while joining records with the catalog.
#[derive(Debug, Clone)]
pub enum BuildWarning {
	/// Spawn records reference an entity the catalog does not know.
	UnknownEntity {
		entity_id: String,
		files: Vec<PathBuf>,
	},
}

impl BuildWarning {
	pub fn message(&self) -> String {
		match self {
			Self::UnknownEntity { entity_id, files } => {
				let files = files
					.iter()
					.map(|file| format!("`{}`", file.display()))
					.collect::<Vec<_>>()
					.join(", ");
				format!("entity `{entity_id}` has no catalog entry; records from {files} excluded")
			}
		}
	}
}

/// The full page set for one run plus data-integrity warnings.
#[derive(Debug, Default)]
pub struct BuildReport {
	/// One page per entity with at least one resolvable record, sorted by
	/// entity id.
	pub pages: Vec<PageDocument>,
	pub warnings: Vec<BuildWarning>,
}

/// Derive the deterministic page identifier for an entity. The entity id is
/// lowercased and any character outside `[a-z0-9_-]` becomes `_` so the id is
/// always a valid page name.
pub fn page_id(namespace: &str, entity_id: &str) -> String {
	let mut slug = String::with_capacity(entity_id.len());
	for ch in entity_id.to_lowercase().chars() {
		if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' || ch == '-' {
			slug.push(ch);
		} else {
			slug.push('_');
		}
	}
	format!("{namespace}:{slug}")
}

/// Join spawn records with catalog metadata and render one page per entity.
///
/// Records arrive in load order (sorted source file, then declaration order
/// within the file), which is the order they are rendered in. Entities with
/// records but no catalog entry are excluded and reported; catalog entries
/// with zero records simply produce no page.
pub fn build_pages(
	catalog: &Catalog,
	records: &[LoadedRecord],
	namespace: &str,
	provenance: &str,
) -> BuildReport {
	let mut by_entity: BTreeMap<&str, Vec<&LoadedRecord>> = BTreeMap::new();
	for loaded in records {
		by_entity
			.entry(loaded.record.entity_id.as_str())
			.or_default()
			.push(loaded);
	}

	let mut report = BuildReport::default();

	for (entity_id, entity_records) in by_entity {
		let Some(entry) = catalog.get(entity_id) else {
			let mut files: Vec<PathBuf> =
				entity_records.iter().map(|r| r.file.clone()).collect();
			files.dedup();
			let warning = BuildWarning::UnknownEntity {
				entity_id: entity_id.to_string(),
				files,
			};
			warn!("{}", warning.message());
			report.warnings.push(warning);
			continue;
		};

		report.pages.push(PageDocument {
			page_id: page_id(namespace, entity_id),
			entity_id: entity_id.to_string(),
			content: render_page(entry, &entity_records, provenance),
		});
	}

	report
}

/// Render the canonical page text for one entity.
///
/// This is a pure function of (catalog entry, ordered records, provenance):
/// no clock, no external state, byte-identical output for identical inputs.
/// The provenance marker is embedded in the footer, so a marker change alone
/// is a content change.
pub fn render_page(entry: &CatalogEntry, records: &[&LoadedRecord], provenance: &str) -> String {
	let display = entry.display_name.as_str();
	let mut lines: Vec<String> = vec![
		format!("====== {display} ======"),
		String::new(),
		format!("Spawn conditions for **{display}**."),
	];

	let mut header_fields: Vec<(String, String)> = Vec::new();
	if let Some(category) = &entry.category {
		header_fields.push(("Category".to_string(), category.clone()));
	}
	for (key, value) in &entry.extra {
		header_fields.push((key.clone(), format_value(value)));
	}
	if !header_fields.is_empty() {
		lines.push(String::new());
		for (key, value) in header_fields {
			lines.push(format!("**{key}:** {value}"));
		}
	}

	for (ordinal, loaded) in records.iter().enumerate() {
		lines.push(String::new());
		lines.push(format!("===== Spawn {} =====", ordinal + 1));

		if !loaded.record.extra.is_empty() {
			lines.push(String::new());
			for (key, value) in &loaded.record.extra {
				lines.push(format!("**{key}:** {}", format_value(value)));
			}
		}

		for clause in &loaded.record.conditions {
			lines.push(String::new());
			lines.push("^ Condition ^ Value ^".to_string());
			for (key, value) in clause {
				lines.push(format!("| {key} | {} |", format_value(value)));
			}
		}
	}

	lines.push(String::new());
	lines.push("----".to_string());
	lines.push(format!("Provenance: {provenance}"));
	lines.push("//Generated automatically from the datapack repository. Edits made here will be overwritten.//".to_string());

	let mut content = lines.join("\n");
	content.push('\n');
	content
}

/// Render an opaque JSON value for display in page text. Maps iterate in
/// sorted key order (serde_json's default backing), so output is stable.
pub fn format_value(value: &Value) -> String {
	match value {
		Value::Null => String::new(),
		Value::Bool(b) => b.to_string(),
		Value::Number(n) => n.to_string(),
		Value::String(s) => s.clone(),
		Value::Array(items) => {
			items.iter().map(format_value).collect::<Vec<_>>().join(", ")
		}
		Value::Object(map) => {
			map.iter()
				.map(|(key, value)| format!("{key}: {}", format_value(value)))
				.collect::<Vec<_>>()
				.join("; ")
		}
	}
}
