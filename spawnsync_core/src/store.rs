use std::collections::BTreeMap;
use std::sync::Mutex;

use miette::Diagnostic;
use thiserror::Error;

/// Errors produced by the remote page-store boundary.
///
/// `Auth` is always fatal for the run. `Network` is fatal only when it occurs
/// before any page has been resolved; after that the engine records it as a
/// per-page failure and continues.
#[derive(Debug, Clone, Diagnostic, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreError {
	#[error("authentication rejected by remote service: {0}")]
	#[diagnostic(
		code(spawnsync::store_auth),
		help("check the configured user and password")
	)]
	Auth(String),

	#[error("remote service unreachable: {0}")]
	#[diagnostic(code(spawnsync::store_network))]
	Network(String),

	#[error("malformed remote response: {0}")]
	#[diagnostic(code(spawnsync::store_protocol))]
	Protocol(String),

	#[error("remote fault {code}: {message}")]
	#[diagnostic(code(spawnsync::store_fault))]
	Fault { code: i32, message: String },
}

/// The two-operation capability interface over the remote documentation
/// service. The engine never sees transport details beyond this.
pub trait PageStore {
	/// Fetch the current stored content for a page, or `None` if the page
	/// does not exist yet.
	fn get(&self, page_id: &str) -> Result<Option<String>, StoreError>;

	/// Write new content to a page, creating it if necessary. One call per
	/// changed page; pages are never batched.
	fn put(&self, page_id: &str, content: &str, summary: &str) -> Result<(), StoreError>;
}

/// An in-memory page store. Backs the test suite so the engine's core logic
/// runs without any network dependency, and doubles as a scratch target for
/// local experiments.
#[derive(Debug, Default)]
pub struct MemoryPageStore {
	pages: Mutex<BTreeMap<String, String>>,
	writes: Mutex<Vec<String>>,
}

impl MemoryPageStore {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Seed a page as if it already existed remotely.
	pub fn seed(&self, page_id: impl Into<String>, content: impl Into<String>) {
		if let Ok(mut pages) = self.pages.lock() {
			pages.insert(page_id.into(), content.into());
		}
	}

	/// The current content of a page, if present.
	pub fn page(&self, page_id: &str) -> Option<String> {
		self.pages.lock().ok().and_then(|pages| pages.get(page_id).cloned())
	}

	/// Page ids in the order they were written, one entry per `put` call.
	pub fn write_log(&self) -> Vec<String> {
		self.writes.lock().map(|writes| writes.clone()).unwrap_or_default()
	}

	pub fn page_count(&self) -> usize {
		self.pages.lock().map(|pages| pages.len()).unwrap_or(0)
	}
}

impl PageStore for MemoryPageStore {
	fn get(&self, page_id: &str) -> Result<Option<String>, StoreError> {
		Ok(self.page(page_id))
	}

	fn put(&self, page_id: &str, content: &str, _summary: &str) -> Result<(), StoreError> {
		if let Ok(mut pages) = self.pages.lock() {
			pages.insert(page_id.to_string(), content.to_string());
		}
		if let Ok(mut writes) = self.writes.lock() {
			writes.push(page_id.to_string());
		}
		Ok(())
	}
}
