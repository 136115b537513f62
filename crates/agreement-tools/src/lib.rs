//! # agreement-tools
//!
//! Lookup tools the agent uses to answer questions about customer
//! agreements: the master record, the consumption history and the field
//! activities at the agreement's service point.
//!
//! ```text
//!   maestro (id_acuerdo, nombre_cliente, id_punto_servicio)
//!      │ id_acuerdo                       │ id_punto_servicio
//!      ▼                                  ▼
//!   consumos (fecha, consumo_kwh)      actividades (descripcion_actividad, fecha_actividad)
//! ```
//!
//! Every tool answers with either
//!
//! ```text
//! Source: consumos y maestro
//! | nombre_cliente | fecha      | consumo_kwh |
//! |:---------------|:-----------|------------:|
//! | Ana Ruiz       | 2024-01-31 |       350.5 |
//! ```
//!
//! or exactly `No information found for agreement <id>.`

pub mod error;
pub mod model;
pub mod phrases;
pub mod store;
pub mod svckit;

use std::sync::Arc;

use agent_core::{Locale, RoutingPolicy, ToolRegistry};

pub use error::{Result, StoreError};
pub use model::{Cell, Table};
pub use store::{AgreementStore, MemoryStore, SqliteStore};

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::{
        QueryConsumptionRecordsTool,
        QueryCustomerMasterTool,
        QueryFieldActivitiesTool,
    };
}

/// Register the three lookups against one store
pub fn register_tools(registry: &mut ToolRegistry, store: &Arc<dyn AgreementStore>, locale: Locale) {
    registry.register(tools::QueryCustomerMasterTool::new(Arc::clone(store), locale));
    registry.register(tools::QueryConsumptionRecordsTool::new(Arc::clone(store), locale));
    registry.register(tools::QueryFieldActivitiesTool::new(Arc::clone(store), locale));
}

/// Registry holding the three lookups
pub fn tool_registry(store: &Arc<dyn AgreementStore>, locale: Locale) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    register_tools(&mut registry, store, locale);
    registry
}

/// Marker routing tuned to this crate's source and not-found phrases
pub fn marker_routing(locale: Locale) -> RoutingPolicy {
    RoutingPolicy::SourceMarkers(phrases::terminal_markers(locale))
}
