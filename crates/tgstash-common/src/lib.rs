//! # tgstash-common
//!
//! Shared types, configuration, error handling, and utilities used across all tgstash crates.
//! This is the foundation layer — no I/O, just primitives and contracts.

pub mod config;
pub mod error;
pub mod models;
pub mod short_id;
pub mod validation;
