//! # focus-sync
//!
//! The per-user sync store reconciling state pushed by two independent
//! clients: the bot conversation and the web app. Records live for the
//! process lifetime; there is no persistence and no deletion.

mod store;

pub use store::{SyncDelta, SyncRecord, SyncStore};
