//! Triage Engine - Multi-turn pediatric symptom triage orchestration
//!
//! Each turn merges extracted entities into a per-conversation session,
//! screens for danger signals, asks for missing facts, and renders a
//! rule-based urgency decision once enough is known.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
