//! Core domain models shared across all tgstash crates.
//!
//! These are the "truth" types — what the key-value store holds and the API serializes.

pub mod file;
pub mod upload;

/// Re-export all model types for convenience.
pub use file::*;
pub use upload::*;
