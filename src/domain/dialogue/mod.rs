//! Dialogue Domain Module
//!
//! The finite-state controller that chooses the next system action each turn,
//! together with the state and intent vocabulary it works over.

pub mod controller;
pub mod state;

pub use controller::{transition, DialogueAction, Transition};
pub use state::{DialogueState, Intent};
