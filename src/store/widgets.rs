//! Widget record store.
//!
//! One row per placed widget. Single-writer discipline: only the update
//! scheduler mutates rows (enforced structurally by per-key job dedup, not
//! by locking); everything else reads.

use crate::error::{Result, WidgetError};
use crate::store::Database;
use crate::widget::{WidgetPayload, WidgetRecord, WidgetSize, WidgetType};
use rusqlite::{Row, params};

/// Durable store of [`WidgetRecord`] rows.
#[derive(Clone)]
pub struct WidgetStore {
    db: Database,
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<WidgetRecord> {
    let kind: String = row.get(1)?;
    let size: String = row.get(2)?;
    let payload: Option<String> = row.get(3)?;
    Ok(WidgetRecord {
        widget_id: row.get(0)?,
        kind: WidgetType::from_id(&kind),
        size: WidgetSize::parse_lenient(&size),
        payload: payload.as_deref().and_then(WidgetPayload::decode),
        last_updated: row.get(4)?,
    })
}

impl WidgetStore {
    /// Create a store over the shared engine database.
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Fetch one record by id.
    pub fn get(&self, widget_id: i64) -> Result<Option<WidgetRecord>> {
        let conn = self.db.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT widget_id, kind, size, payload, last_updated \
                 FROM widgets WHERE widget_id = ?1",
            )
            .map_err(|e| WidgetError::Store(e.to_string()))?;
        let mut rows = stmt
            .query_map(params![widget_id], row_to_record)
            .map_err(|e| WidgetError::Store(e.to_string()))?;
        match rows.next() {
            Some(record) => Ok(Some(record.map_err(|e| WidgetError::Store(e.to_string()))?)),
            None => Ok(None),
        }
    }

    /// Insert or fully replace a record.
    pub fn upsert(&self, record: &WidgetRecord) -> Result<()> {
        let conn = self.db.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO widgets (widget_id, kind, size, payload, last_updated) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.widget_id,
                record.kind.id(),
                record.size.id(),
                record.payload.as_ref().map(WidgetPayload::encode),
                record.last_updated,
            ],
        )
        .map_err(|e| WidgetError::Store(e.to_string()))?;
        Ok(())
    }

    /// Commit a refreshed payload to an existing row.
    ///
    /// Returns `false` when the row no longer exists — the widget was
    /// deleted while the refresh ran. The caller must treat that as
    /// entity-gone and must not resurrect the record.
    pub fn commit_payload(
        &self,
        widget_id: i64,
        payload: &WidgetPayload,
        last_updated: i64,
    ) -> Result<bool> {
        let conn = self.db.lock()?;
        let changed = conn
            .execute(
                "UPDATE widgets SET payload = ?2, last_updated = ?3 WHERE widget_id = ?1",
                params![widget_id, payload.encode(), last_updated],
            )
            .map_err(|e| WidgetError::Store(e.to_string()))?;
        Ok(changed > 0)
    }

    /// Delete a record. Returns `true` when a row was removed.
    pub fn delete_by_id(&self, widget_id: i64) -> Result<bool> {
        let conn = self.db.lock()?;
        let changed = conn
            .execute("DELETE FROM widgets WHERE widget_id = ?1", params![widget_id])
            .map_err(|e| WidgetError::Store(e.to_string()))?;
        Ok(changed > 0)
    }

    /// List all records of one widget type.
    pub fn list_by_type(&self, kind: WidgetType) -> Result<Vec<WidgetRecord>> {
        let conn = self.db.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT widget_id, kind, size, payload, last_updated \
                 FROM widgets WHERE kind = ?1 ORDER BY widget_id",
            )
            .map_err(|e| WidgetError::Store(e.to_string()))?;
        let rows = stmt
            .query_map(params![kind.id()], row_to_record)
            .map_err(|e| WidgetError::Store(e.to_string()))?;

        let mut records = Vec::new();
        for r in rows {
            records.push(r.map_err(|e| WidgetError::Store(e.to_string()))?);
        }
        Ok(records)
    }

    /// List every placed widget.
    pub fn list_all(&self) -> Result<Vec<WidgetRecord>> {
        let conn = self.db.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT widget_id, kind, size, payload, last_updated \
                 FROM widgets ORDER BY widget_id",
            )
            .map_err(|e| WidgetError::Store(e.to_string()))?;
        let rows = stmt
            .query_map([], row_to_record)
            .map_err(|e| WidgetError::Store(e.to_string()))?;

        let mut records = Vec::new();
        for r in rows {
            records.push(r.map_err(|e| WidgetError::Store(e.to_string()))?);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::widget::types::CalendarStyle;

    fn store() -> WidgetStore {
        WidgetStore::new(Database::open_in_memory().expect("open db"))
    }

    fn calendar_record(widget_id: i64) -> WidgetRecord {
        WidgetRecord {
            widget_id,
            kind: WidgetType::Calendar(CalendarStyle::Type1),
            size: WidgetSize::Medium,
            payload: Some(WidgetPayload::Calendar {
                year: 2024,
                month: 3,
                today_day: Some(15),
                selected_day: Some(15),
                background_path: None,
            }),
            last_updated: 1_700_000_000,
        }
    }

    #[test]
    fn upsert_and_get_round_trip() {
        let store = store();
        let record = calendar_record(7);
        store.upsert(&record).expect("upsert");
        assert_eq!(store.get(7).expect("get"), Some(record));
    }

    #[test]
    fn get_missing_is_none() {
        assert_eq!(store().get(42).expect("get"), None);
    }

    #[test]
    fn upsert_replaces_whole_record() {
        let store = store();
        store.upsert(&calendar_record(7)).expect("first upsert");

        let replacement = WidgetRecord::placed(7, WidgetType::Photo, WidgetSize::Large);
        store.upsert(&replacement).expect("second upsert");
        assert_eq!(store.get(7).expect("get"), Some(replacement));
    }

    #[test]
    fn commit_payload_updates_existing_row() {
        let store = store();
        store
            .upsert(&WidgetRecord::placed(3, WidgetType::Quote, WidgetSize::Small))
            .expect("upsert");

        let payload = WidgetPayload::Quote {
            quotes: vec!["onward".into()],
            current_index: 0,
        };
        let committed = store.commit_payload(3, &payload, 123).expect("commit");
        assert!(committed);

        let record = store.get(3).expect("get").expect("record");
        assert_eq!(record.payload, Some(payload));
        assert_eq!(record.last_updated, 123);
    }

    #[test]
    fn commit_payload_observes_deleted_row() {
        let store = store();
        let payload = WidgetPayload::Quote {
            quotes: vec!["gone".into()],
            current_index: 0,
        };
        let committed = store.commit_payload(99, &payload, 1).expect("commit");
        assert!(!committed);
        // The commit must not resurrect the row.
        assert_eq!(store.get(99).expect("get"), None);
    }

    #[test]
    fn delete_by_id_reports_presence() {
        let store = store();
        store.upsert(&calendar_record(5)).expect("upsert");
        assert!(store.delete_by_id(5).expect("delete"));
        assert!(!store.delete_by_id(5).expect("second delete"));
        assert_eq!(store.get(5).expect("get"), None);
    }

    #[test]
    fn list_by_type_filters() {
        let store = store();
        store.upsert(&calendar_record(1)).expect("upsert");
        store
            .upsert(&WidgetRecord::placed(2, WidgetType::Photo, WidgetSize::Medium))
            .expect("upsert");
        store.upsert(&calendar_record(3)).expect("upsert");

        let calendars = store
            .list_by_type(WidgetType::Calendar(CalendarStyle::Type1))
            .expect("list");
        let ids: Vec<i64> = calendars.iter().map(|r| r.widget_id).collect();
        assert_eq!(ids, vec![1, 3]);

        assert_eq!(store.list_all().expect("list all").len(), 3);
    }

    #[test]
    fn corrupt_payload_blob_degrades_to_none() {
        let store = store();
        store.upsert(&calendar_record(9)).expect("upsert");
        store
            .db
            .lock()
            .expect("lock")
            .execute(
                "UPDATE widgets SET payload = 'not valid json' WHERE widget_id = 9",
                [],
            )
            .expect("corrupt row");

        let record = store.get(9).expect("get").expect("record");
        assert_eq!(record.payload, None);
        assert_eq!(record.kind, WidgetType::Calendar(CalendarStyle::Type1));
    }

    #[test]
    fn unknown_kind_and_size_degrade() {
        let store = store();
        store
            .db
            .lock()
            .expect("lock")
            .execute(
                "INSERT INTO widgets (widget_id, kind, size, payload, last_updated) \
                 VALUES (11, 'widget_from_the_future', 'gigantic', NULL, 0)",
                [],
            )
            .expect("insert raw row");

        let record = store.get(11).expect("get").expect("record");
        assert_eq!(record.kind, WidgetType::None);
        assert_eq!(record.size, WidgetSize::Medium);
    }
}
