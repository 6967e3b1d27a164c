//! Session domain module.
//!
//! The per-conversation record, its slot vocabulary, the entity merger and
//! the persisted-record codec with read-path migration.

pub mod merger;
pub mod migration;
pub mod slots;
pub mod state;

pub use merger::{merge_entities, normalize_symptom, MergeDelta};
pub use migration::{decode_session, encode_session, RecordDecodeError};
pub use slots::{is_placeholder, names as slot_names, SlotValue, Slots};
pub use state::{SessionState, CURRENT_SCHEMA_VERSION};
