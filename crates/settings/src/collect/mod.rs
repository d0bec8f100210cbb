//! Field collection: rebuilding "what the user currently sees".
//!
//! Each rendered widget is bound to a key-path by a [`FieldDescriptor`]. On
//! every tab switch and every save, [`collect`] walks the descriptors of the
//! currently mounted form and reconstructs a tree fragment from live widget
//! state; the fragment is then deep-merged into the canonical tree.
//!
//! Two write disciplines coexist here. Native inputs (text, number, toggle,
//! key-value rows, room rows, record rows) park their values on screen until
//! collection. Chip, tag, and entity-list widgets instead mutate the
//! canonical tree the instant the user acts; for those kinds, collection
//! simply re-reads the tree value, which is already current.

use hearth_key_path as key_path;
use indexmap::IndexMap;
use serde_json::{Map, Number, Value};
use tracing::debug;

/// How a widget serializes its on-screen state into the tree's native shape.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetKind {
    /// Free-form text input.
    Text,
    /// Numeric input. `step` distinguishes integer from float semantics in
    /// a schema-less tree: a step with no fractional part stores integers.
    Number { step: f64 },
    /// Boolean toggle.
    Toggle,
    /// Multi-select chips; tree-backed.
    MultiSelect,
    /// Free-form tag list; tree-backed.
    TagList,
    /// Editable key/value rows.
    KeyValueMap,
    /// Single entity-reference picker; tree-backed.
    EntitySingle,
    /// Entity-reference list; tree-backed.
    EntityList,
    /// One entity picker per room, stored as `{room: entity_id}`.
    RoomEntityMap,
    /// Dynamic list of records (e.g. household members): one row per record,
    /// `fields` in display order, rows missing `required` are dropped.
    RecordList {
        fields: Vec<String>,
        required: String,
    },
}

impl WidgetKind {
    /// Tree-backed kinds are written at interaction time and never read from
    /// the screen.
    pub fn is_tree_backed(&self) -> bool {
        matches!(
            self,
            WidgetKind::MultiSelect
                | WidgetKind::TagList
                | WidgetKind::EntitySingle
                | WidgetKind::EntityList
        )
    }
}

/// Binds a rendered widget to a key-path.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub path: String,
    pub kind: WidgetKind,
}

impl FieldDescriptor {
    pub fn new(path: impl Into<String>, kind: WidgetKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// One row of a [`WidgetKind::RoomEntityMap`] widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomRow {
    pub room: String,
    pub entity_id: String,
}

/// Live on-screen state of a single widget, as handed over by the renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetState {
    Text(String),
    /// Raw input text of a numeric field, parsed during collection.
    Number(String),
    Toggle(bool),
    KeyValueRows(Vec<(String, String)>),
    RoomRows(Vec<RoomRow>),
    RecordRows(Vec<IndexMap<String, String>>),
}

/// What the renderer exposes for the currently mounted tab.
pub trait FormView {
    /// Descriptors for every widget on the active tab.
    fn fields(&self) -> Vec<FieldDescriptor>;

    /// Live state of the widget bound at `path`, or `None` when the widget
    /// is not currently mounted.
    fn state(&self, path: &str) -> Option<WidgetState>;
}

/// Reconstructs the tree fragment the user can currently see.
///
/// Only the active tab's form is consulted; correctness for other tabs
/// depends on their values having been merged into `tree` by a prior
/// collection. Unmounted widgets, unparsable numbers, and path conflicts
/// all degrade to "field skipped". Collection never fails.
pub fn collect(form: &dyn FormView, tree: &Value) -> Value {
    let mut fragment = Value::Object(Map::new());
    for field in form.fields() {
        let value = if field.kind.is_tree_backed() {
            key_path::get(tree, &field.path).cloned()
        } else {
            form.state(&field.path)
                .and_then(|state| collected_value(&field, state))
        };
        let Some(value) = value else { continue };
        if let Err(err) = key_path::set(&mut fragment, &field.path, value) {
            debug!(path = %field.path, %err, "skipping field with conflicting path");
        }
    }
    fragment
}

fn collected_value(field: &FieldDescriptor, state: WidgetState) -> Option<Value> {
    match (&field.kind, state) {
        (WidgetKind::Text, WidgetState::Text(text)) => Some(Value::String(text)),
        (WidgetKind::Toggle, WidgetState::Toggle(on)) => Some(Value::Bool(on)),
        (WidgetKind::Number { step }, WidgetState::Number(raw)) => parse_number(&raw, *step),
        (WidgetKind::KeyValueMap, WidgetState::KeyValueRows(rows)) => Some(kv_map(rows)),
        (WidgetKind::RoomEntityMap, WidgetState::RoomRows(rows)) => Some(room_map(rows)),
        (WidgetKind::RecordList { fields, required }, WidgetState::RecordRows(rows)) => {
            Some(record_list(fields, required, rows))
        }
        (kind, state) => {
            debug!(path = %field.path, ?kind, ?state, "widget state does not match descriptor");
            None
        }
    }
}

/// Float-parse `raw`; integer-coerce when the widget's step has no
/// fractional part. Unparsable or non-finite input yields `None` so the
/// tree keeps its previous value.
fn parse_number(raw: &str, step: f64) -> Option<Value> {
    let parsed: f64 = raw.trim().parse().ok()?;
    if !parsed.is_finite() {
        return None;
    }
    if step.fract() == 0.0 {
        if let Some(int) = as_integer(parsed) {
            return Some(Value::from(int));
        }
    }
    Number::from_f64(parsed).map(Value::Number)
}

fn as_integer(parsed: f64) -> Option<i64> {
    if parsed.fract() == 0.0 && parsed >= i64::MIN as f64 && parsed <= i64::MAX as f64 {
        Some(parsed as i64)
    } else {
        None
    }
}

/// Rebuild a key-value map from rendered rows, dropping empty-key rows.
/// A value is numeric-coerced iff it round-trips unchanged through
/// float→string conversion; otherwise it stays a string.
fn kv_map(rows: Vec<(String, String)>) -> Value {
    let mut map = Map::new();
    for (key, raw) in rows {
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        map.insert(key.to_string(), coerce_scalar(&raw));
    }
    Value::Object(map)
}

pub(crate) fn coerce_scalar(raw: &str) -> Value {
    let trimmed = raw.trim();
    if let Ok(parsed) = trimmed.parse::<f64>() {
        if parsed.is_finite() && parsed.to_string() == trimmed {
            if let Some(int) = as_integer(parsed) {
                return Value::from(int);
            }
            return Value::from(parsed);
        }
    }
    Value::String(raw.to_string())
}

/// One row per known room plus any manually-added rows; rows without a
/// room or without a selected entity are dropped.
fn room_map(rows: Vec<RoomRow>) -> Value {
    let mut map = Map::new();
    for row in rows {
        let room = row.room.trim();
        if room.is_empty() || row.entity_id.is_empty() {
            continue;
        }
        map.insert(room.to_string(), Value::String(row.entity_id));
    }
    Value::Object(map)
}

fn record_list(fields: &[String], required: &str, rows: Vec<IndexMap<String, String>>) -> Value {
    let records = rows
        .into_iter()
        .filter(|row| row.get(required).is_some_and(|v| !v.trim().is_empty()))
        .map(|row| {
            let mut record = Map::new();
            for field in fields {
                if let Some(value) = row.get(field) {
                    if !value.is_empty() {
                        record.insert(field.clone(), Value::String(value.clone()));
                    }
                }
            }
            Value::Object(record)
        })
        .collect();
    Value::Array(records)
}
