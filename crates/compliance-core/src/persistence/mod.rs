//! Persistence layer for compliance records
//!
//! Provides SQLite-backed storage for scientists, teams, IBC applications,
//! publications with their audit trail, facilities and certificates.

mod repository;
mod schema;

pub use repository::Repository;
pub use schema::{Schema, SCHEMA_VERSION};
