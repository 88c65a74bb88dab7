//! # focus-providers
//!
//! AI provider implementations for FocusHelper.

pub mod decompose;
pub mod lmstudio;
pub mod openrouter;
