//! # focus-channels
//!
//! Messaging channel implementations for FocusHelper.

pub mod max;
