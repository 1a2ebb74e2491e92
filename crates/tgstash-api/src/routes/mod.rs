//! API route modules.

pub mod admin;
pub mod assets;
pub mod files;
pub mod health;
pub mod uploads;
