use async_trait::async_trait;
use chrono::{Duration, Utc};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use crate::error::MembershipError;
use crate::logging::database::Database;
use crate::logging::time::{parse_iso8601_string, to_iso8601_utc_string};
use crate::plans::Plan;
use crate::subscription::{Subscription, SubscriptionPatch, SubscriptionStatus, SubscriptionStore};

const SUBSCRIPTION_PERIOD_DAYS: i64 = 30;

fn text_date(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<chrono::DateTime<Utc>> {
    let s: String = row.get(idx)?;
    parse_iso8601_string(&s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
        )
    })
}

fn row_to_subscription(row: &rusqlite::Row<'_>) -> rusqlite::Result<Subscription> {
    let plan_s: String = row.get(2)?;
    let status_s: String = row.get(3)?;
    let pending_plan_s: Option<String> = row.get(6)?;
    let pending_change_date_s: Option<String> = row.get(7)?;

    let pending_plan = match pending_plan_s {
        Some(s) => Some(Plan::parse(&s).ok_or_else(|| {
            rusqlite::Error::InvalidColumnType(6, "pending_plan".into(), rusqlite::types::Type::Text)
        })?),
        None => None,
    };
    let pending_change_date = match pending_change_date_s {
        Some(s) => Some(parse_iso8601_string(&s).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                7,
                rusqlite::types::Type::Text,
                Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
            )
        })?),
        None => None,
    };

    Ok(Subscription {
        id: row.get(0)?,
        user_id: row.get(1)?,
        plan: Plan::parse(&plan_s).ok_or_else(|| {
            rusqlite::Error::InvalidColumnType(2, "plan".into(), rusqlite::types::Type::Text)
        })?,
        status: SubscriptionStatus::parse(&status_s).ok_or_else(|| {
            rusqlite::Error::InvalidColumnType(3, "status".into(), rusqlite::types::Type::Text)
        })?,
        start_date: text_date(row, 4)?,
        end_date: text_date(row, 5)?,
        pending_plan,
        pending_change_date,
    })
}

const SELECT_COLUMNS: &str =
    "id, user_id, plan, status, start_date, end_date, pending_plan, pending_change_date";

#[async_trait]
impl SubscriptionStore for Database {
    async fn find_active_subscription(
        &self,
        user_id: &str,
    ) -> Result<Option<Subscription>, MembershipError> {
        let conn = self.connection.lock().await;
        let sub = conn
            .query_row(
                &format!(
                    "SELECT {SELECT_COLUMNS} FROM subscriptions
                     WHERE user_id = ?1 AND status = 'active'"
                ),
                [user_id],
                row_to_subscription,
            )
            .optional()?;
        Ok(sub)
    }

    async fn create_subscription(
        &self,
        user_id: &str,
        plan: Plan,
    ) -> Result<Subscription, MembershipError> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let end_date = now + Duration::days(SUBSCRIPTION_PERIOD_DAYS);

        let conn = self.connection.lock().await;
        conn.execute(
            "INSERT INTO subscriptions (id, user_id, plan, status, start_date, end_date, pending_plan, pending_change_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, NULL)",
            rusqlite::params![
                &id,
                user_id,
                plan.as_str(),
                SubscriptionStatus::Active.as_str(),
                to_iso8601_utc_string(&now),
                to_iso8601_utc_string(&end_date),
            ],
        )?;

        Ok(Subscription {
            id,
            user_id: user_id.to_string(),
            plan,
            status: SubscriptionStatus::Active,
            start_date: now,
            end_date,
            pending_plan: None,
            pending_change_date: None,
        })
    }

    async fn update_subscription(
        &self,
        id: &str,
        patch: SubscriptionPatch,
    ) -> Result<Option<Subscription>, MembershipError> {
        let conn = self.connection.lock().await;
        let existing = conn
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM subscriptions WHERE id = ?1"),
                [id],
                row_to_subscription,
            )
            .optional()?;
        let Some(mut sub) = existing else {
            return Ok(None);
        };

        if let Some(plan) = patch.plan {
            sub.plan = plan;
        }
        if let Some(pending) = patch.pending_plan {
            sub.pending_plan = pending;
        }
        if let Some(date) = patch.pending_change_date {
            sub.pending_change_date = date;
        }

        conn.execute(
            "UPDATE subscriptions
             SET plan = ?1, pending_plan = ?2, pending_change_date = ?3
             WHERE id = ?4",
            rusqlite::params![
                sub.plan.as_str(),
                sub.pending_plan.map(Plan::as_str),
                sub.pending_change_date.map(|d| to_iso8601_utc_string(&d)),
                id,
            ],
        )?;

        Ok(Some(sub))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn test_db() -> (tempfile::TempDir, Database) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::new(db_path.to_str().unwrap()).await.unwrap();
        (dir, db)
    }

    #[tokio::test]
    async fn creates_thirty_day_active_subscription() {
        let (_dir, db) = test_db().await;

        let sub = db.create_subscription("u1", Plan::Basic).await.unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Active);
        let period = sub.end_date - sub.start_date;
        assert_eq!(period.num_days(), SUBSCRIPTION_PERIOD_DAYS);

        let found = db.find_active_subscription("u1").await.unwrap().unwrap();
        assert_eq!(found.id, sub.id);
        assert_eq!(found.plan, Plan::Basic);
        assert!(found.pending_plan.is_none());

        assert!(db.find_active_subscription("u2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn patch_distinguishes_set_and_clear() {
        let (_dir, db) = test_db().await;
        let sub = db.create_subscription("u1", Plan::Elite).await.unwrap();

        // Queue a downgrade.
        let updated = db
            .update_subscription(
                &sub.id,
                SubscriptionPatch {
                    pending_plan: Some(Some(Plan::Basic)),
                    pending_change_date: Some(Some(sub.end_date)),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.plan, Plan::Elite);
        assert_eq!(updated.pending_plan, Some(Plan::Basic));

        // A patch that says nothing about pending fields leaves them alone.
        let updated = db
            .update_subscription(
                &sub.id,
                SubscriptionPatch {
                    plan: Some(Plan::Premium),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.plan, Plan::Premium);
        assert_eq!(updated.pending_plan, Some(Plan::Basic));

        // Explicit clear.
        let updated = db
            .update_subscription(
                &sub.id,
                SubscriptionPatch {
                    pending_plan: Some(None),
                    pending_change_date: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert!(updated.pending_plan.is_none());
        assert!(updated.pending_change_date.is_none());

        let stored = db.find_active_subscription("u1").await.unwrap().unwrap();
        assert_eq!(stored.plan, Plan::Premium);
        assert!(stored.pending_plan.is_none());
    }

    #[tokio::test]
    async fn updating_missing_subscription_returns_none() {
        let (_dir, db) = test_db().await;
        let result = db
            .update_subscription(
                "missing",
                SubscriptionPatch {
                    plan: Some(Plan::Basic),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn dates_survive_storage_roundtrip() {
        let (_dir, db) = test_db().await;
        let sub = db.create_subscription("u1", Plan::Premium).await.unwrap();
        let found = db.find_active_subscription("u1").await.unwrap().unwrap();
        // Stored at second precision.
        assert_eq!(found.start_date.timestamp(), sub.start_date.timestamp());
        assert_eq!(found.end_date.timestamp(), sub.end_date.timestamp());
    }
}
