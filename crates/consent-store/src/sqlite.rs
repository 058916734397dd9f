//! SQLite-backed consent store

use crate::StoreError;
use consent_domain::{ConsentArtifact, ConsentId, ConsentStore};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::Path;
use tracing::debug;

/// Durable consent store
///
/// Each artifact is kept as its JSON document, keyed by consent ID and
/// ordered by insertion.
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Share a `SqliteStore` across
/// threads only behind a mutex.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a store at the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use consent_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("consents.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    fn decode(document: &str) -> Result<ConsentArtifact, StoreError> {
        Ok(serde_json::from_str(document)?)
    }
}

impl ConsentStore for SqliteStore {
    type Error = StoreError;

    fn put(&mut self, id: &ConsentId, artifact: ConsentArtifact) -> Result<(), Self::Error> {
        let document = serde_json::to_string(&artifact)?;
        let inserted = self.conn.execute(
            "INSERT INTO consents (consent_id, document) VALUES (?1, ?2)",
            params![id.to_string(), &document],
        );

        match inserted {
            Ok(_) => {}
            // consent_id is the only constrained column
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                return Err(StoreError::Duplicate(*id));
            }
            Err(e) => return Err(e.into()),
        }
        debug!(consent_id = %id, "Inserted consent row");

        Ok(())
    }

    fn get(&self, id: &ConsentId) -> Result<Option<ConsentArtifact>, Self::Error> {
        let document: Option<String> = self
            .conn
            .query_row(
                "SELECT document FROM consents WHERE consent_id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        document.as_deref().map(Self::decode).transpose()
    }

    fn update(&mut self, id: &ConsentId, artifact: ConsentArtifact) -> Result<(), Self::Error> {
        let document = serde_json::to_string(&artifact)?;
        let changed = self.conn.execute(
            "UPDATE consents SET document = ?2 WHERE consent_id = ?1",
            params![id.to_string(), &document],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound(*id));
        }
        debug!(consent_id = %id, "Overwrote consent row");

        Ok(())
    }

    fn values(&self) -> Result<Vec<ConsentArtifact>, Self::Error> {
        let mut stmt = self
            .conn
            .prepare("SELECT document FROM consents ORDER BY seq")?;

        let documents = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        documents.iter().map(|d| Self::decode(d)).collect()
    }

    fn len(&self) -> Result<usize, Self::Error> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM consents", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
