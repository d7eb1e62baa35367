use chrono::{DateTime, Utc};
use rusqlite::{Connection, Result};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::logging::time::parse_iso8601_string;

/// One row per handled API request, for operational visibility.
#[derive(Debug, Clone)]
pub struct RequestLog {
    #[allow(dead_code)]
    pub id: Option<i64>,
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub path: String,
    pub user_id: Option<String>,
    pub plan: Option<String>,
    pub status_code: u16,
    pub response_time_ms: i64,
    pub error: Option<String>,
}

/// SQLite store behind every persistence trait in the service. A
/// single connection guarded by an async mutex; the database is the
/// sole point of truth and serializes writes per record.
#[derive(Clone)]
pub struct Database {
    pub(crate) connection: Arc<Mutex<Connection>>,
}

impl Database {
    pub async fn new(database_path: &str) -> Result<Self> {
        if let Some(parent) = std::path::Path::new(database_path).parent() {
            if !parent.exists() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    return Err(rusqlite::Error::SqliteFailure(
                        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                        Some(format!("Failed to create directory: {}", e)),
                    ));
                }
                tracing::info!("Created database directory: {}", parent.display());
            }
        }

        let conn = Connection::open(database_path)?;
        tracing::info!("Database initialized at: {}", database_path);

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                full_name TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS subscriptions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                plan TEXT NOT NULL,
                status TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                pending_plan TEXT,
                pending_change_date TEXT
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS content_items (
                id TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                url TEXT NOT NULL,
                thumbnail TEXT,
                required_plan TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS request_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                method TEXT NOT NULL,
                path TEXT NOT NULL,
                user_id TEXT,
                plan TEXT,
                status_code INTEGER NOT NULL,
                response_time_ms INTEGER NOT NULL,
                error TEXT
            )",
            [],
        )?;

        Ok(Self {
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    pub async fn log_request(&self, log: RequestLog) -> Result<i64> {
        let conn = self.connection.lock().await;

        conn.execute(
            "INSERT INTO request_logs (
                timestamp, method, path, user_id, plan,
                status_code, response_time_ms, error
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            (
                log.timestamp.to_rfc3339(),
                &log.method,
                &log.path,
                &log.user_id,
                &log.plan,
                log.status_code,
                log.response_time_ms,
                &log.error,
            ),
        )?;

        Ok(conn.last_insert_rowid())
    }

    #[allow(dead_code)]
    pub async fn get_recent_logs(&self, limit: i32) -> Result<Vec<RequestLog>> {
        let conn = self.connection.lock().await;

        let mut stmt = conn.prepare(
            "SELECT id, timestamp, method, path, user_id, plan,
                    status_code, response_time_ms, error
             FROM request_logs
             ORDER BY timestamp DESC
             LIMIT ?1",
        )?;

        let log_iter = stmt.query_map([limit], |row| {
            let timestamp_s: String = row.get(1)?;
            Ok(RequestLog {
                id: Some(row.get(0)?),
                timestamp: parse_iso8601_string(&timestamp_s).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        1,
                        rusqlite::types::Type::Text,
                        Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
                    )
                })?,
                method: row.get(2)?,
                path: row.get(3)?,
                user_id: row.get(4)?,
                plan: row.get(5)?,
                status_code: row.get(6)?,
                response_time_ms: row.get(7)?,
                error: row.get(8)?,
            })
        })?;

        let mut logs = Vec::new();
        for log in log_iter {
            logs.push(log?);
        }

        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn logs_requests_and_reads_them_back() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::new(db_path.to_str().unwrap()).await.unwrap();

        let id = db
            .log_request(RequestLog {
                id: None,
                timestamp: Utc::now(),
                method: "POST".into(),
                path: "/subscription/change".into(),
                user_id: Some("u1".into()),
                plan: Some("elite".into()),
                status_code: 200,
                response_time_ms: 12,
                error: None,
            })
            .await
            .unwrap();
        assert!(id > 0);

        let logs = db.get_recent_logs(10).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].path, "/subscription/change");
        assert_eq!(logs[0].plan.as_deref(), Some("elite"));
    }
}
