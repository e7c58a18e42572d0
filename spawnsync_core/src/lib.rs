//! `spawnsync_core` is the synchronization engine that keeps a wiki's spawn
//! documentation in step with a datapack's structured spawn-definition files.
//! Spawn records and a reference catalog are loaded from disk, folded into
//! one canonical page per entity, compared against current remote state, and
//! only the pages whose content differs are written back.
//!
//! ## Pipeline
//!
//! ```text
//! Spawn dir (*.json)  ──►  records::load_spawn_dir  ─┐
//!                                                    ├─►  render::build_pages  ──►  engine::sync_pages
//! Catalog file        ──►  catalog::load_catalog   ──┘                                    │
//!                                                                      PageStore (get/put)┘
//! ```
//!
//! ## Key Types
//!
//! - [`SpawnRecord`] / [`LoadedRecord`] — one spawn rule with its source
//!   provenance inside the input tree.
//! - [`Catalog`] / [`CatalogEntry`] — the entity id to display metadata map.
//! - [`PageDocument`] — the canonical rendered text for one entity's page.
//! - [`PageStore`] — the two-operation remote boundary (`get`/`put`), with
//!   [`MemoryPageStore`] for tests and [`DokuWikiStore`] for real runs.
//! - [`SyncReport`] — per-page outcomes for the final summary and exit
//!   status.
//!
//! Rendering is a pure function of (catalog entry, ordered records,
//! provenance marker), so identical inputs always produce byte-identical
//! pages and a second run over unchanged inputs writes nothing.

pub use catalog::*;
pub use config::*;
pub use dokuwiki::*;
pub use engine::*;
pub use error::*;
pub use records::*;
pub use render::*;
pub use store::*;

pub mod catalog;
pub mod config;
mod dokuwiki;
mod engine;
mod error;
pub mod records;
mod render;
pub mod store;

#[cfg(test)]
mod __fixtures;
