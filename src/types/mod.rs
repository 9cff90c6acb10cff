//! Request and response types for the API surface the runner consumes.

pub mod chat;
pub mod common;
pub mod files;
pub mod fine_tuning;
pub mod models;
