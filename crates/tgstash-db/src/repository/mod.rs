//! Repository layer — record access organized by domain.

pub mod files;
