//! The editing session.
//!
//! A [`Session`] owns the canonical settings tree, the auxiliary scenes
//! document, the autosave machine, the entity catalog, and the active tab
//! id. Every component reads and writes the tree through it; there is no
//! other copy and no versioning, so a save reflects tree state at the moment
//! its collection pass ran.
//!
//! The session is sans-I/O. Methods return [`Command`] values naming the
//! work the host event loop must perform (arm a timer, PUT a document,
//! fetch the catalog); the host reports outcomes back through the
//! `*_resolved` methods.

use std::time::Duration;

use hearth_key_path as key_path;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::autosave::{AutoSave, SaveState};
use crate::collect::{collect, FormView};
use crate::entity::{EntityBinding, EntityCatalog, EntityRecord};
use crate::persist::{self, SaveAck, SaveError, SaveRequest};
use crate::tree_merge::merge;

/// Work the host event loop must perform on the session's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// (Re)start the debounce timer; call
    /// [`Session::debounce_elapsed`] when it fires.
    ScheduleDebounce(Duration),
    /// PUT the primary document; call [`Session::save_resolved`] with the
    /// outcome.
    BeginSave(SaveRequest),
    /// PUT the scenes document; call [`Session::aux_save_resolved`].
    BeginAuxSave(SaveRequest),
    /// GET the entity catalog; call [`Session::catalog_resolved`] or
    /// [`Session::catalog_fetch_failed`].
    FetchCatalog,
}

/// A direct mutation of a session document, dispatched the instant the user
/// acts. Chip, tag, and entity widgets edit through intents; native inputs
/// are collected at save/switch time instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Overwrite the value at `path`.
    SetPath { path: String, value: Value },
    /// Add `value` to the list at `path`, set semantics. A missing or
    /// non-list value becomes a fresh one-element list, since the widget owns
    /// the path.
    AppendToList { path: String, value: Value },
    /// Filter `value` out of the list at `path`.
    RemoveFromList { path: String, value: Value },
    /// Set one entry of the map at `path`.
    SetMapEntry {
        path: String,
        key: String,
        value: Value,
    },
}

/// The editing session. Created on load, torn down on session end; the
/// canonical tree is replaced wholesale on reload.
#[derive(Debug)]
pub struct Session {
    settings: Value,
    scenes: Value,
    scenes_dirty: bool,
    autosave: AutoSave,
    catalog: EntityCatalog,
    active_tab: String,
    last_save_error: Option<SaveError>,
    restart_needed: bool,
}

impl Session {
    /// Start a session from the initial backend snapshots.
    pub fn new(settings: Value, scenes: Value, active_tab: impl Into<String>) -> Self {
        Self {
            settings,
            scenes,
            scenes_dirty: false,
            autosave: AutoSave::default(),
            catalog: EntityCatalog::new(),
            active_tab: active_tab.into(),
            last_save_error: None,
            restart_needed: false,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.autosave = AutoSave::new(debounce);
        self
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn settings(&self) -> &Value {
        &self.settings
    }

    pub fn scenes(&self) -> &Value {
        &self.scenes
    }

    pub fn active_tab(&self) -> &str {
        &self.active_tab
    }

    pub fn save_state(&self) -> SaveState {
        self.autosave.state()
    }

    pub fn last_save_error(&self) -> Option<&SaveError> {
        self.last_save_error.as_ref()
    }

    /// Whether a completed save flagged that a dependent subsystem must be
    /// restarted before the new settings take effect.
    pub fn restart_needed(&self) -> bool {
        self.restart_needed
    }

    // ── Session lifecycle ─────────────────────────────────────────────────

    /// Replace the canonical tree wholesale (fresh backend snapshot).
    /// Pending edits and errors are discarded along with the old tree.
    pub fn reload(&mut self, settings: Value) {
        self.settings = settings;
        self.autosave = AutoSave::default();
        self.last_save_error = None;
    }

    pub fn reload_scenes(&mut self, scenes: Value) {
        self.scenes = scenes;
        self.scenes_dirty = false;
    }

    // ── Edits ─────────────────────────────────────────────────────────────

    /// A native input changed on screen. The value stays in the form until
    /// the next collection; this only pokes the scheduler.
    pub fn note_edit(&mut self) -> Option<Command> {
        self.autosave.note_edit().map(Command::ScheduleDebounce)
    }

    /// Apply a direct mutation to the canonical tree and poke the
    /// scheduler.
    pub fn apply(&mut self, intent: Intent) -> Option<Command> {
        apply_intent(&mut self.settings, intent);
        self.note_edit()
    }

    /// Apply a direct mutation to the scenes document, marking it dirty so
    /// it rides behind the next primary save.
    pub fn apply_to_scenes(&mut self, intent: Intent) -> Option<Command> {
        apply_intent(&mut self.scenes, intent);
        self.scenes_dirty = true;
        self.note_edit()
    }

    // ── Tabs ──────────────────────────────────────────────────────────────

    /// Switch tabs: collect the outgoing (currently mounted) form, merge it
    /// into the canonical tree, then make `to` the active tab. The caller
    /// re-renders the new tab from [`Session::settings`], which now reflects
    /// every edit the outgoing tab held.
    pub fn switch_tab(&mut self, to: impl Into<String>, outgoing: &dyn FormView) {
        self.collect_into_tree(outgoing);
        let to = to.into();
        debug!(from = %self.active_tab, to = %to, "tab switch");
        self.active_tab = to;
    }

    // ── Save lifecycle ────────────────────────────────────────────────────

    /// The debounce timer fired. Collects the active form once more, merges
    /// it, and hands the host a fully prepared save. Stale timers yield
    /// `None`.
    pub fn debounce_elapsed(&mut self, form: &dyn FormView) -> Option<Command> {
        if !self.autosave.debounce_elapsed() {
            return None;
        }
        self.collect_into_tree(form);
        Some(Command::BeginSave(persist::prepare(&self.settings)))
    }

    /// The in-flight primary save resolved. On failure the canonical tree
    /// is left untouched and the error is surfaced; edits that arrived while
    /// the save ran trigger exactly one follow-up save either way. Once the
    /// primary save settles, a dirty scenes document rides behind it.
    pub fn save_resolved(
        &mut self,
        outcome: Result<SaveAck, SaveError>,
        form: &dyn FormView,
    ) -> Vec<Command> {
        match outcome {
            Ok(ack) => {
                self.last_save_error = None;
                if ack.restart_required {
                    self.restart_needed = true;
                }
            }
            Err(err) => {
                warn!(%err, "settings save failed");
                self.last_save_error = Some(err);
            }
        }

        let mut commands = Vec::new();
        if self.autosave.save_resolved() {
            // Edits arrived during the save; collect them and go again.
            self.collect_into_tree(form);
            commands.push(Command::BeginSave(persist::prepare(&self.settings)));
        } else if self.scenes_dirty {
            self.scenes_dirty = false;
            commands.push(Command::BeginAuxSave(persist::prepare_scenes(&self.scenes)));
        }
        commands
    }

    /// The scenes save resolved. Failure re-marks the document dirty so the
    /// next primary save carries it again.
    pub fn aux_save_resolved(&mut self, outcome: Result<SaveAck, SaveError>) {
        if let Err(err) = outcome {
            warn!(%err, "scenes save failed");
            self.scenes_dirty = true;
            self.last_save_error = Some(err);
        }
    }

    // ── Entities ──────────────────────────────────────────────────────────

    /// Lazily load the entity catalog. The first caller gets
    /// [`Command::FetchCatalog`]; callers arriving before the fetch
    /// resolves share it.
    pub fn ensure_catalog(&mut self) -> Option<Command> {
        self.catalog.ensure().then_some(Command::FetchCatalog)
    }

    pub fn catalog_resolved(&mut self, records: Vec<EntityRecord>) {
        self.catalog.resolve(records);
    }

    pub fn catalog_fetch_failed(&mut self) {
        self.catalog.fetch_failed();
    }

    pub fn catalog(&self) -> &EntityCatalog {
        &self.catalog
    }

    pub fn filter_entities(&self, query: &str, domains: &[&str]) -> Vec<&EntityRecord> {
        self.catalog.filter(query, domains)
    }

    /// Route an entity selection into the widget's write-back mode.
    pub fn select_entity(&mut self, binding: &EntityBinding, entity_id: &str) -> Option<Command> {
        self.apply(binding.select_intent(entity_id))
    }

    /// Remove an entity from a list-bound widget.
    pub fn deselect_entity(&mut self, path: &str, entity_id: &str) -> Option<Command> {
        self.apply(Intent::RemoveFromList {
            path: path.to_string(),
            value: entity_id.into(),
        })
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn collect_into_tree(&mut self, form: &dyn FormView) {
        let fragment = collect(form, &self.settings);
        merge(&mut self.settings, &fragment);
    }
}

fn apply_intent(tree: &mut Value, intent: Intent) {
    match intent {
        Intent::SetPath { path, value } => {
            if let Err(err) = key_path::set(tree, &path, value) {
                warn!(%path, %err, "set dropped");
            }
        }
        Intent::AppendToList { path, value } => {
            let is_list = matches!(key_path::get(tree, &path), Some(Value::Array(_)));
            if is_list {
                if let Some(Value::Array(list)) = key_path::get_mut(tree, &path) {
                    if !list.contains(&value) {
                        list.push(value);
                    }
                }
            } else if let Err(err) = key_path::set(tree, &path, Value::Array(vec![value])) {
                warn!(%path, %err, "append dropped");
            }
        }
        Intent::RemoveFromList { path, value } => {
            if let Some(Value::Array(list)) = key_path::get_mut(tree, &path) {
                list.retain(|item| item != &value);
            }
        }
        Intent::SetMapEntry { path, key, value } => {
            let is_map = matches!(key_path::get(tree, &path), Some(Value::Object(_)));
            if is_map {
                if let Some(Value::Object(map)) = key_path::get_mut(tree, &path) {
                    map.insert(key, value);
                }
            } else {
                let mut fresh = Map::new();
                fresh.insert(key, value);
                if let Err(err) = key_path::set(tree, &path, Value::Object(fresh)) {
                    warn!(%path, %err, "map entry dropped");
                }
            }
        }
    }
}
