//! Terminal rendering and owner-facing commands

pub mod holdings;
pub mod manage;
pub mod metadata;
pub mod refresh;
pub mod setup;
pub mod summary;
pub mod ui;
