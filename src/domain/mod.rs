//! Domain layer containing triage logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Identifiers, validation errors, schema upcasting
//! - `dialogue` - Dialogue states, intents and the action controller
//! - `session` - Per-conversation state, slots, entity merging, record codec
//! - `triage` - Rule tables, normalization and the triage rule engine
//! - `profile` - Child profile used for slot auto-fill

pub mod dialogue;
pub mod foundation;
pub mod profile;
pub mod session;
pub mod triage;
