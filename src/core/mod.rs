//! Core Framework Components
//!
//! Shared error types used by every stage of the pipeline.

pub mod error;

pub use error::{Result, TtsError};
