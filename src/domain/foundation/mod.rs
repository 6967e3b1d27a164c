//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, error types and schema-evolution infrastructure
//! that form the vocabulary of the triage domain.

mod errors;
mod ids;
mod upcaster;

pub use errors::ValidationError;
pub use ids::{ConversationId, UserId};
pub use upcaster::{UpcastError, Upcaster, UpcasterRegistry, SCHEMA_VERSION_FIELD};
