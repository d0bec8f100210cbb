#![allow(dead_code)]

use std::collections::HashMap;

use hearth_settings::{FieldDescriptor, FormView, WidgetKind, WidgetState};

/// Renderer stand-in: the descriptors mounted on one tab plus their live
/// widget state.
pub struct MockForm {
    fields: Vec<FieldDescriptor>,
    states: HashMap<String, WidgetState>,
}

impl MockForm {
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            states: HashMap::new(),
        }
    }

    /// A tab with no collectable widgets mounted.
    pub fn empty() -> Self {
        Self::new()
    }

    pub fn field(mut self, path: &str, kind: WidgetKind) -> Self {
        self.fields.push(FieldDescriptor::new(path, kind));
        self
    }

    pub fn state(mut self, path: &str, state: WidgetState) -> Self {
        self.states.insert(path.to_string(), state);
        self
    }

    pub fn set_state(&mut self, path: &str, state: WidgetState) {
        self.states.insert(path.to_string(), state);
    }
}

impl FormView for MockForm {
    fn fields(&self) -> Vec<FieldDescriptor> {
        self.fields.clone()
    }

    fn state(&self, path: &str) -> Option<WidgetState> {
        self.states.get(path).cloned()
    }
}
