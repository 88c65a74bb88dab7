//! # focus-memory
//!
//! In-memory per-user conversation state: dialogue position and the
//! user-data snapshot the reminder scheduler reads. State lives for the
//! process lifetime only.

mod store;

pub use store::{ContextStore, DialogueState};
