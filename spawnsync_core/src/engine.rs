use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::SyncResult;
use crate::render::PageDocument;
use crate::store::PageStore;
use crate::store::StoreError;

/// What happened to one page during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
	/// Remote content already matched the canonical render; nothing written.
	Unchanged,
	/// The page was created or replaced. `previous` is the remote content
	/// before the write (`None` when the page did not exist).
	Written { previous: Option<String> },
	/// The page could not be read or written; the run continued.
	Failed { reason: String },
}

/// Per-page result row for the final summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult {
	pub page_id: String,
	pub entity_id: String,
	pub outcome: PageOutcome,
}

/// Accumulated outcomes for a whole run.
#[derive(Debug, Default)]
pub struct SyncReport {
	pub results: Vec<PageResult>,
}

impl SyncReport {
	pub fn written(&self) -> usize {
		self.results
			.iter()
			.filter(|r| matches!(r.outcome, PageOutcome::Written { .. }))
			.count()
	}

	pub fn unchanged(&self) -> usize {
		self.results
			.iter()
			.filter(|r| matches!(r.outcome, PageOutcome::Unchanged))
			.count()
	}

	pub fn failed(&self) -> usize {
		self.results
			.iter()
			.filter(|r| matches!(r.outcome, PageOutcome::Failed { .. }))
			.count()
	}

	/// Returns true if every page was either unchanged or written.
	pub fn is_ok(&self) -> bool {
		self.failed() == 0
	}
}

/// Normalize text for comparison: CRLF to LF, trailing whitespace stripped
/// per line, outer whitespace trimmed. The write payload stays unnormalized;
/// only the equality check uses this.
pub fn normalize(content: &str) -> String {
	content
		.replace("\r\n", "\n")
		.lines()
		.map(str::trim_end)
		.collect::<Vec<_>>()
		.join("\n")
		.trim()
		.to_string()
}

/// The edit summary attached to every remote write, tying the change back to
/// the triggering change set.
pub fn edit_summary(provenance: &str) -> String {
	format!("Automated spawn data update ({provenance})")
}

/// Compare each canonical page against remote state and write back only the
/// pages whose content differs.
///
/// Pages are processed sequentially with a per-page get-then-put pair, so no
/// two writes for the same page can overlap. Write failures are isolated:
/// one failing page never prevents attempting the rest. Authentication
/// failures, and any remote failure before the first page has been resolved,
/// abort the whole run instead.
pub fn sync_pages(
	store: &dyn PageStore,
	pages: &[PageDocument],
	provenance: &str,
) -> SyncResult<SyncReport> {
	let summary = edit_summary(provenance);
	let mut report = SyncReport::default();

	for page in pages {
		let current = match store.get(&page.page_id) {
			Ok(current) => current,
			Err(err) if is_run_fatal(&err, report.results.is_empty()) => return Err(err.into()),
			Err(err) => {
				warn!(page = %page.page_id, "fetch failed: {err}");
				report.results.push(PageResult {
					page_id: page.page_id.clone(),
					entity_id: page.entity_id.clone(),
					outcome: PageOutcome::Failed {
						reason: err.to_string(),
					},
				});
				continue;
			}
		};

		let outcome = match &current {
			Some(remote) if normalize(remote) == normalize(&page.content) => {
				debug!(page = %page.page_id, "unchanged");
				PageOutcome::Unchanged
			}
			_ => match store.put(&page.page_id, &page.content, &summary) {
				Ok(()) => {
					info!(page = %page.page_id, "written");
					PageOutcome::Written { previous: current }
				}
				Err(err @ StoreError::Auth(_)) => return Err(err.into()),
				Err(err) => {
					warn!(page = %page.page_id, "write failed: {err}");
					PageOutcome::Failed {
						reason: err.to_string(),
					}
				}
			},
		};

		report.results.push(PageResult {
			page_id: page.page_id.clone(),
			entity_id: page.entity_id.clone(),
			outcome,
		});
	}

	Ok(report)
}

/// Bad credentials are systemic. A network failure on the very first remote
/// call means the service is unreachable, so there is no point attempting the
/// remaining pages either.
fn is_run_fatal(err: &StoreError, first_call: bool) -> bool {
	match err {
		StoreError::Auth(_) => true,
		StoreError::Network(_) => first_call,
		StoreError::Protocol(_) | StoreError::Fault { .. } => false,
	}
}
