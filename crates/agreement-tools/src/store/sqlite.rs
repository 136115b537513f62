//! SQLite-backed agreement store. Opens a read-only connection per lookup.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, params};

use super::AgreementStore;
use crate::error::Result;
use crate::model::{Cell, Table};

/// Tables the lookups read. Used to create fixture databases.
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS maestro (
    id_acuerdo TEXT PRIMARY KEY,
    nombre_cliente TEXT NOT NULL,
    id_punto_servicio TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS consumos (
    id_acuerdo TEXT NOT NULL,
    fecha TEXT NOT NULL,
    consumo_kwh REAL NOT NULL
);
CREATE TABLE IF NOT EXISTS actividades (
    id_punto_servicio TEXT NOT NULL,
    descripcion_actividad TEXT NOT NULL,
    fecha_actividad TEXT NOT NULL
);
";

const MASTER_SQL: &str = "SELECT * FROM maestro WHERE id_acuerdo = ?1";

const CONSUMPTION_SQL: &str = "
SELECT m.nombre_cliente, c.fecha, c.consumo_kwh
FROM consumos c
JOIN maestro m ON c.id_acuerdo = m.id_acuerdo
WHERE c.id_acuerdo = ?1
ORDER BY c.fecha";

const ACTIVITIES_SQL: &str = "
SELECT m.nombre_cliente, a.descripcion_actividad, a.fecha_actividad
FROM actividades a
JOIN maestro m ON a.id_punto_servicio = m.id_punto_servicio
WHERE m.id_acuerdo = ?1
ORDER BY a.fecha_actividad";

/// Store over an existing SQLite file (`maestro`, `consumos`, `actividades`)
pub struct SqliteStore {
    db_path: PathBuf,
    name: String,
}

impl SqliteStore {
    /// Point at an existing database. Nothing is opened until the first lookup.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let db_path = path.as_ref().to_path_buf();
        let name = format!("sqlite:{}", db_path.display());
        Self { db_path, name }
    }

    /// Create the file and the three tables if missing
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self::new(path))
    }

    async fn lookup(&self, sql: &'static str, agreement_id: &str) -> Result<Table> {
        let db_path = self.db_path.clone();
        let agreement_id = agreement_id.to_string();
        let table = tokio::task::spawn_blocking(move || -> Result<Table> {
            let conn = open_read_only(&db_path)?;
            read_table(&conn, sql, &agreement_id)
        })
        .await??;
        tracing::debug!(store = %self.name, rows = table.len(), "Lookup finished");
        Ok(table)
    }
}

fn open_read_only(path: &Path) -> rusqlite::Result<Connection> {
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
}

fn read_table(conn: &Connection, sql: &str, agreement_id: &str) -> Result<Table> {
    let mut stmt = conn.prepare(sql)?;
    let mut table = Table::new(stmt.column_names());
    let width = table.columns.len();

    let mut rows = stmt.query(params![agreement_id])?;
    while let Some(row) = rows.next()? {
        let cells = (0..width)
            .map(|i| row.get_ref(i).map(Cell::from))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        table.push_row(cells);
    }
    Ok(table)
}

impl From<ValueRef<'_>> for Cell {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Self::Null,
            ValueRef::Integer(v) => Self::Integer(v),
            ValueRef::Real(v) => Self::Real(v),
            ValueRef::Text(bytes) => Self::Text(String::from_utf8_lossy(bytes).into_owned()),
            ValueRef::Blob(bytes) => Self::Text(format!("<{} bytes>", bytes.len())),
        }
    }
}

#[async_trait]
impl AgreementStore for SqliteStore {
    async fn customer_master(&self, agreement_id: &str) -> Result<Table> {
        self.lookup(MASTER_SQL, agreement_id).await
    }

    async fn consumption_records(&self, agreement_id: &str) -> Result<Table> {
        self.lookup(CONSUMPTION_SQL, agreement_id).await
    }

    async fn field_activities(&self, agreement_id: &str) -> Result<Table> {
        self.lookup(ACTIVITIES_SQL, agreement_id).await
    }

    async fn health_check(&self) -> bool {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            open_read_only(&db_path)
                .and_then(|conn| conn.query_row("SELECT COUNT(*) FROM maestro", [], |_| Ok(())))
                .is_ok()
        })
        .await
        .unwrap_or(false)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
