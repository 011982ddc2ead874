use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

/// store kind reported by the liveness probe
pub const STORE_KIND: &str = "SQLite";

/// the SMILES column is a fixed placeholder until real generation lands
pub const SMILES_PLACEHOLDER: &str = "TODO: Gerar SMILES";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("geometry serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("record {0} not found")]
    NotFound(i64),
}

/// One persisted optimization outcome. Records are created exactly once per
/// successful request and never updated or deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct MoleculeRecord {
    pub id: i64,
    pub name: String,
    pub smiles: String,
    pub energy: f64,
    pub geometry: Vec<[f64; 3]>,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::init(Connection::open(path)?)
    }

    /// In-memory database for testing.
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS molecules (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL DEFAULT 'Unknown',
                smiles TEXT,
                energy REAL,
                geometry TEXT
            )",
            [],
        )?;
        Ok(Self { conn })
    }

    /// Insert a record and read it back under its generated id.
    pub fn insert(
        &self,
        name: &str,
        energy: f64,
        geometry: &[[f64; 3]],
    ) -> Result<MoleculeRecord, StoreError> {
        let geometry_json = serde_json::to_string(geometry)?;
        self.conn.execute(
            "INSERT INTO molecules (name, smiles, energy, geometry)
             VALUES (?1, ?2, ?3, ?4)",
            params![name, SMILES_PLACEHOLDER, energy, geometry_json],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get(id)?.ok_or(StoreError::NotFound(id))
    }

    pub fn get(&self, id: i64) -> Result<Option<MoleculeRecord>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, smiles, energy, geometry
                 FROM molecules WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, f64>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;
        match row {
            Some((id, name, smiles, energy, geometry_json)) => {
                let geometry = serde_json::from_str(&geometry_json)?;
                Ok(Some(MoleculeRecord {
                    id,
                    name,
                    smiles,
                    energy,
                    geometry,
                }))
            }
            None => Ok(None),
        }
    }
}
