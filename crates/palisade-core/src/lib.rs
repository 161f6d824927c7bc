//! Palisade Core — shared domain models and error types for the
//! session-security core.

pub mod error;
pub mod models;
