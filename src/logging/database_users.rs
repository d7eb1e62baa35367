use async_trait::async_trait;
use chrono::Utc;
use rusqlite::OptionalExtension;
use uuid::Uuid;

use crate::error::MembershipError;
use crate::logging::database::Database;
use crate::logging::time::{parse_iso8601_string, to_iso8601_utc_string};
use crate::users::{CreateUserPayload, User, UserAuthRecord, UserStore, hash_password};

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let created_at_s: String = row.get(3)?;
    let updated_at_s: String = row.get(4)?;
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        full_name: row.get(2)?,
        created_at: parse_iso8601_string(&created_at_s).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
            )
        })?,
        updated_at: parse_iso8601_string(&updated_at_s).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                rusqlite::types::Type::Text,
                Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
            )
        })?,
    })
}

#[async_trait]
impl UserStore for Database {
    async fn create_user(&self, payload: CreateUserPayload) -> Result<User, MembershipError> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let email = payload.email.trim().to_lowercase();
        let full_name = payload
            .full_name
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| email.clone());
        let password_hash = hash_password(&payload.password)?;

        let conn = self.connection.lock().await;
        let exists: Option<String> = conn
            .query_row("SELECT id FROM users WHERE email = ?1", [&email], |row| {
                row.get(0)
            })
            .optional()?;
        if exists.is_some() {
            return Err(MembershipError::EmailTaken);
        }

        conn.execute(
            "INSERT INTO users (id, email, full_name, password_hash, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                &id,
                &email,
                &full_name,
                &password_hash,
                to_iso8601_utc_string(&now),
                to_iso8601_utc_string(&now),
            ],
        )?;

        Ok(User {
            id,
            email,
            full_name,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, MembershipError> {
        let conn = self.connection.lock().await;
        let user = conn
            .query_row(
                "SELECT id, email, full_name, created_at, updated_at FROM users WHERE id = ?1",
                [id],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    async fn find_auth_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserAuthRecord>, MembershipError> {
        let email = email.trim().to_lowercase();
        let conn = self.connection.lock().await;
        let record = conn
            .query_row(
                "SELECT id, email, full_name, created_at, updated_at, password_hash
                 FROM users WHERE email = ?1",
                [&email],
                |row| {
                    Ok(UserAuthRecord {
                        user: row_to_user(row)?,
                        password_hash: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }
}
