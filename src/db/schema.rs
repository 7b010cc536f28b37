//! SQL DDL for initializing the credential storage.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema with:
/// - `user`: the account table credentials hang off (UUID text keys)
/// - `googlecredentials`: at most one row per user, enforced by `UNIQUE(user_id)`
/// - `ON DELETE CASCADE` so removing a user drops its credential
///
/// Cascades only fire when the connection has `foreign_keys` enabled.
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS "user" (
    id TEXT PRIMARY KEY NOT NULL,
    email TEXT NOT NULL UNIQUE,
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS googlecredentials (
    id TEXT PRIMARY KEY NOT NULL,
    user_id TEXT NOT NULL UNIQUE REFERENCES "user"(id) ON DELETE CASCADE,
    credentials_json TEXT NOT NULL,
    expiry TEXT NULL -- RFC3339
);
"#;
