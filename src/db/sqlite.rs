use crate::db::models::{DbUser, GoogleCredential};
use crate::db::schema::SQLITE_INIT;
use crate::error::NexusError;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;
use uuid::Uuid;

pub type SqlitePool = Pool<Sqlite>;

#[derive(Clone)]
pub struct CredentialsStorage {
    pool: SqlitePool,
}

impl CredentialsStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database at `database_url` and apply the schema.
    pub async fn connect(database_url: &str) -> Result<Self, NexusError> {
        let connect_opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new().connect_with(connect_opts).await?;
        let storage = Self::new(pool);
        storage.init_schema().await?;
        Ok(storage)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), NexusError> {
        // execute multiple statements safely (SQLite supports multi-commands but sqlx::query doesn't)
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Insert or overwrite the credential for `user_id` in one statement.
    /// Uses SQLite `INSERT ... ON CONFLICT(user_id) DO UPDATE ... RETURNING`,
    /// so the row id survives updates and concurrent writers cannot create a
    /// second row. `expiry` always replaces the stored value.
    pub async fn upsert_credential(
        &self,
        user_id: Uuid,
        credentials_json: &str,
        expiry: Option<DateTime<Utc>>,
    ) -> Result<GoogleCredential, NexusError> {
        let row = sqlx::query(
            r#"
            INSERT INTO googlecredentials (id, user_id, credentials_json, expiry)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                credentials_json=excluded.credentials_json,
                expiry=excluded.expiry
            RETURNING id, user_id, credentials_json, expiry
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id.to_string())
        .bind(credentials_json)
        .bind(expiry.map(|e| e.to_rfc3339()))
        .fetch_one(&self.pool)
        .await?;
        Self::row_to_credential(row)
    }

    /// Overwrite the credential for `user_id` only while it still holds
    /// `expected_json`. Returns `false` when the row was changed or removed
    /// since it was read; the stored value is then left alone.
    pub async fn update_credential_if_unchanged(
        &self,
        user_id: Uuid,
        expected_json: &str,
        credentials_json: &str,
        expiry: Option<DateTime<Utc>>,
    ) -> Result<bool, NexusError> {
        let result = sqlx::query(
            r#"UPDATE googlecredentials SET credentials_json = ?, expiry = ?
               WHERE user_id = ? AND credentials_json = ?"#,
        )
        .bind(credentials_json)
        .bind(expiry.map(|e| e.to_rfc3339()))
        .bind(user_id.to_string())
        .bind(expected_json)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn get_credential(
        &self,
        user_id: Uuid,
    ) -> Result<Option<GoogleCredential>, NexusError> {
        let row = sqlx::query(
            r#"SELECT id, user_id, credentials_json, expiry
               FROM googlecredentials WHERE user_id = ?"#,
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_credential).transpose()
    }

    pub async fn create_user(&self, email: &str) -> Result<DbUser, NexusError> {
        let user = DbUser {
            id: Uuid::new_v4(),
            email: email.to_string(),
            is_active: true,
        };
        sqlx::query(r#"INSERT INTO "user" (id, email, is_active) VALUES (?, ?, 1)"#)
            .bind(user.id.to_string())
            .bind(&user.email)
            .execute(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Option<DbUser>, NexusError> {
        let row = sqlx::query(r#"SELECT id, email, is_active FROM "user" WHERE id = ?"#)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_user).transpose()
    }

    pub async fn set_user_active(&self, id: Uuid, active: bool) -> Result<(), NexusError> {
        let active_i = if active { 1 } else { 0 };
        sqlx::query(r#"UPDATE "user" SET is_active = ? WHERE id = ?"#)
            .bind(active_i)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Delete a user; its credential row goes with it via `ON DELETE CASCADE`.
    pub async fn delete_user(&self, id: Uuid) -> Result<(), NexusError> {
        sqlx::query(r#"DELETE FROM "user" WHERE id = ?"#)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    fn row_to_credential(row: SqliteRow) -> Result<GoogleCredential, NexusError> {
        let id: String = row.try_get("id")?;
        let user_id: String = row.try_get("user_id")?;
        let credentials_json: String = row.try_get("credentials_json")?;
        let expiry_str: Option<String> = row.try_get("expiry")?;

        let expiry = expiry_str
            .map(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| sqlx::Error::Decode(Box::new(e)))
            })
            .transpose()?;

        Ok(GoogleCredential {
            id: parse_uuid(&id)?,
            user_id: parse_uuid(&user_id)?,
            credentials_json,
            expiry,
        })
    }

    fn row_to_user(row: SqliteRow) -> Result<DbUser, NexusError> {
        let id: String = row.try_get("id")?;
        let email: String = row.try_get("email")?;
        let active_i: i64 = row.try_get("is_active")?;
        Ok(DbUser {
            id: parse_uuid(&id)?,
            email,
            is_active: active_i != 0,
        })
    }
}

fn parse_uuid(s: &str) -> Result<Uuid, sqlx::Error> {
    Uuid::parse_str(s).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}
