//! Agreement Store
//!
//! Read-only access to the `maestro`, `consumos` and `actividades` tables.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::{SCHEMA, SqliteStore};

use async_trait::async_trait;

use crate::error::Result;
use crate::model::Table;

/// Column names shared by every store implementation
pub mod columns {
    pub const MASTER: [&str; 3] = ["id_acuerdo", "nombre_cliente", "id_punto_servicio"];
    pub const CONSUMPTION: [&str; 3] = ["nombre_cliente", "fecha", "consumo_kwh"];
    pub const ACTIVITIES: [&str; 3] = ["nombre_cliente", "descripcion_actividad", "fecha_actividad"];
}

/// Agreement data source (Strategy pattern)
///
/// Every lookup is keyed by agreement id and returns an empty table,
/// never an error, when nothing matches.
#[async_trait]
pub trait AgreementStore: Send + Sync {
    /// All master-record fields for the agreement
    async fn customer_master(&self, agreement_id: &str) -> Result<Table>;

    /// Consumption history joined with the customer name
    async fn consumption_records(&self, agreement_id: &str) -> Result<Table>;

    /// Field activities joined through the service point
    async fn field_activities(&self, agreement_id: &str) -> Result<Table>;

    /// Check if the store is reachable
    async fn health_check(&self) -> bool;

    /// Store name
    fn name(&self) -> &str;
}
