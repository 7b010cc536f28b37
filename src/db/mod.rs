//! Database module: models and schema for persistent storage.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `sqlite.rs`: pool setup and the credential store queries

pub mod models;
pub mod schema;
pub mod sqlite;

pub use models::{DbUser, GoogleCredential};
pub use schema::SQLITE_INIT;
pub use sqlite::{CredentialsStorage, SqlitePool};
