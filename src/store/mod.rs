//! Durable storage for widget records, display states, and pending jobs.
//!
//! Backed by a single SQLite database file (default
//! `{data_dir}/widgets.db`). The three stores share one connection behind a
//! mutex; all writes are serialized, which is sufficient because the
//! scheduler's per-key job uniqueness already prevents conflicting writers
//! for any one widget.

pub mod jobs;
mod schema;
pub mod state;
pub mod widgets;

pub use jobs::JobLedger;
pub use state::{AppWidgetState, WidgetStateStore};
pub use widgets::WidgetStore;

use crate::error::{Result, WidgetError};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Database filename within the data directory.
pub const DB_FILENAME: &str = "widgets.db";

/// Shared handle to the engine database.
///
/// Cheap to clone; all clones use the same connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database at `{dir}/widgets.db` and apply the
    /// schema.
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let conn = Connection::open(dir.join(DB_FILENAME))
            .map_err(|e| WidgetError::Store(format!("cannot open database: {e}")))?;
        schema::apply_schema(&conn)
            .map_err(|e| WidgetError::Store(format!("cannot apply schema: {e}")))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory database. Used by tests and the harness.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| WidgetError::Store(format!("cannot open in-memory database: {e}")))?;
        schema::apply_schema(&conn)
            .map_err(|e| WidgetError::Store(format!("cannot apply schema: {e}")))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Read the schema version stamp.
    pub fn schema_version(&self) -> Result<Option<u32>> {
        let conn = self.lock()?;
        schema::read_schema_version(&conn)
            .map_err(|e| WidgetError::Store(format!("cannot read schema version: {e}")))
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| WidgetError::Store("database mutex poisoned".to_owned()))
    }
}
