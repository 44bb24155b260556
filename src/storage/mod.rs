mod repository;

pub use repository::*;

/// SQL for the initial schema. Every statement is `IF NOT EXISTS`, so it is
/// safe to run on every start.
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");
