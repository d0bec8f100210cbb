//! hearth-settings — synchronization engine for the Hearth configuration
//! editor.
//!
//! The editor renders a large nested settings tree as tabbed forms. This
//! crate keeps the authoritative in-memory copy of the *entire* tree
//! consistent with whatever fraction is currently visible, debounces
//! persistence so overlapping saves cannot corrupt each other, and resolves
//! references to external smart-home entities.
//!
//! The engine is sans-I/O: it is a set of synchronous state machines owned
//! by a [`Session`]. Network round-trips and timers belong to the host event
//! loop, which executes the [`Command`] values the Session emits and feeds
//! the outcomes back in.

pub mod autosave;
pub mod collect;
pub mod entity;
pub mod persist;
pub mod session;
pub mod tree_merge;

pub use autosave::{AutoSave, SaveState, DEFAULT_DEBOUNCE};
pub use collect::{collect, FieldDescriptor, FormView, RoomRow, WidgetKind, WidgetState};
pub use entity::{EntityBinding, EntityCatalog, EntityRecord, PREVIEW_LIMIT};
pub use persist::{DocumentKind, SaveAck, SaveError, SaveRequest, SaveResponse, SERVER_OWNED};
pub use session::{Command, Intent, Session};
pub use tree_merge::merge;
