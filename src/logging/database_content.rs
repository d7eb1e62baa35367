use async_trait::async_trait;
use rusqlite::OptionalExtension;

use crate::content::{ContentItem, ContentKind, ContentStore};
use crate::error::MembershipError;
use crate::logging::database::Database;
use crate::plans::Plan;

fn row_to_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<ContentItem> {
    let kind_s: String = row.get(1)?;
    let required_plan_s: String = row.get(6)?;
    Ok(ContentItem {
        id: row.get(0)?,
        kind: ContentKind::parse(&kind_s).ok_or_else(|| {
            rusqlite::Error::InvalidColumnType(1, "kind".into(), rusqlite::types::Type::Text)
        })?,
        title: row.get(2)?,
        description: row.get(3)?,
        url: row.get(4)?,
        thumbnail: row.get(5)?,
        required_plan: Plan::parse(&required_plan_s).ok_or_else(|| {
            rusqlite::Error::InvalidColumnType(
                6,
                "required_plan".into(),
                rusqlite::types::Type::Text,
            )
        })?,
    })
}

impl Database {
    /// Loads the starter catalog into an empty content table. A table
    /// with any rows is left untouched.
    pub async fn seed_content(&self, items: &[ContentItem]) -> Result<(), MembershipError> {
        let conn = self.connection.lock().await;
        let has_rows = conn
            .query_row("SELECT 1 FROM content_items LIMIT 1", [], |_| Ok(()))
            .optional()?
            .is_some();
        if has_rows {
            return Ok(());
        }

        for item in items {
            conn.execute(
                "INSERT INTO content_items (id, kind, title, description, url, thumbnail, required_plan)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    &item.id,
                    item.kind.as_str(),
                    &item.title,
                    &item.description,
                    &item.url,
                    &item.thumbnail,
                    item.required_plan.as_str(),
                ],
            )?;
        }
        tracing::info!("Seeded {} content items", items.len());
        Ok(())
    }
}

#[async_trait]
impl ContentStore for Database {
    async fn list_content(
        &self,
        kind: Option<ContentKind>,
    ) -> Result<Vec<ContentItem>, MembershipError> {
        let conn = self.connection.lock().await;

        let mut items = Vec::new();
        if let Some(kind) = kind {
            let mut stmt = conn.prepare(
                "SELECT id, kind, title, description, url, thumbnail, required_plan
                 FROM content_items WHERE kind = ?1
                 ORDER BY id",
            )?;
            let iter = stmt.query_map([kind.as_str()], row_to_item)?;
            for item in iter {
                items.push(item?);
            }
        } else {
            let mut stmt = conn.prepare(
                "SELECT id, kind, title, description, url, thumbnail, required_plan
                 FROM content_items
                 ORDER BY kind, id",
            )?;
            let iter = stmt.query_map([], row_to_item)?;
            for item in iter {
                items.push(item?);
            }
        }

        Ok(items)
    }
}
