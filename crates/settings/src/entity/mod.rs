//! Entity-reference resolution.
//!
//! Settings values frequently point at external smart-home entities
//! (`light.kitchen`, `binary_sensor.hall_motion`, …). The catalog of known
//! entities is fetched lazily, once per session, with concurrent callers
//! sharing the single in-flight request. Pickers filter the cached catalog
//! and route a selection into one of three write-back modes, expressed as
//! [`Intent`]s applied to the session tree.
//!
//! [`Intent`]: crate::session::Intent

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::debug;

use crate::session::Intent;

/// UI-level truncation for autocomplete previews. Filtering itself is
/// unbounded.
pub const PREVIEW_LIMIT: usize = 25;

/// One externally sourced smart-home entity. Read-only; cached for the
/// session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EntityRecord {
    pub entity_id: String,
    pub name: String,
    pub domain: String,
    pub state: String,
}

#[derive(Debug, Default)]
enum CatalogState {
    #[default]
    Empty,
    /// A fetch is in flight; later callers wait on it rather than issuing
    /// their own.
    Fetching,
    Ready(IndexMap<String, EntityRecord>),
}

/// Session-cached entity catalog with single-flight fetch semantics.
#[derive(Debug, Default)]
pub struct EntityCatalog {
    state: CatalogState,
}

impl EntityCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure the catalog is loaded or loading. Returns `true` exactly
    /// once per fetch cycle; the caller that receives `true` must perform
    /// the catalog request and report back via [`resolve`] or
    /// [`fetch_failed`].
    ///
    /// [`resolve`]: EntityCatalog::resolve
    /// [`fetch_failed`]: EntityCatalog::fetch_failed
    pub fn ensure(&mut self) -> bool {
        match self.state {
            CatalogState::Empty => {
                self.state = CatalogState::Fetching;
                true
            }
            CatalogState::Fetching | CatalogState::Ready(_) => false,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, CatalogState::Ready(_))
    }

    /// Populate the cache from a fetched catalog.
    pub fn resolve(&mut self, records: Vec<EntityRecord>) {
        debug!(count = records.len(), "entity catalog loaded");
        let table = records
            .into_iter()
            .map(|record| (record.entity_id.clone(), record))
            .collect();
        self.state = CatalogState::Ready(table);
    }

    /// The in-flight fetch failed; a later caller may retry.
    pub fn fetch_failed(&mut self) {
        debug!("entity catalog fetch failed");
        self.state = CatalogState::Empty;
    }

    /// Drop the cache so the next [`ensure`] refetches.
    ///
    /// [`ensure`]: EntityCatalog::ensure
    pub fn invalidate(&mut self) {
        self.state = CatalogState::Empty;
    }

    fn table(&self) -> Option<&IndexMap<String, EntityRecord>> {
        match &self.state {
            CatalogState::Ready(table) => Some(table),
            _ => None,
        }
    }

    pub fn get(&self, entity_id: &str) -> Option<&EntityRecord> {
        self.table()?.get(entity_id)
    }

    /// All cached records in catalog order; empty before the first
    /// resolution.
    pub fn records(&self) -> Vec<&EntityRecord> {
        self.table()
            .map(|table| table.values().collect())
            .unwrap_or_default()
    }

    /// Case-insensitive substring match on id and name, intersected with a
    /// domain allow-list. An empty allow-list admits every domain.
    pub fn filter(&self, query: &str, domains: &[&str]) -> Vec<&EntityRecord> {
        let needle = query.to_lowercase();
        self.table()
            .map(|table| {
                table
                    .values()
                    .filter(|record| {
                        (domains.is_empty() || domains.contains(&record.domain.as_str()))
                            && (needle.is_empty()
                                || record.entity_id.to_lowercase().contains(&needle)
                                || record.name.to_lowercase().contains(&needle))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Where a picker writes its selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityBinding {
    /// Overwrite the bound path with the entity id.
    Scalar { path: String },
    /// Add the entity id to the list at the bound path, set semantics.
    ListAppend { path: String },
    /// Set `map[room] = entity_id` for the row's associated room.
    RoomMap { path: String, room: String },
}

impl EntityBinding {
    /// The intent a selection of `entity_id` dispatches.
    pub fn select_intent(&self, entity_id: &str) -> Intent {
        match self {
            EntityBinding::Scalar { path } => Intent::SetPath {
                path: path.clone(),
                value: entity_id.into(),
            },
            EntityBinding::ListAppend { path } => Intent::AppendToList {
                path: path.clone(),
                value: entity_id.into(),
            },
            EntityBinding::RoomMap { path, room } => Intent::SetMapEntry {
                path: path.clone(),
                key: room.clone(),
                value: entity_id.into(),
            },
        }
    }
}
