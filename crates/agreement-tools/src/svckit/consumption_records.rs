//! Consumption Records Tool
//!
//! Consumption history (`consumos`) joined with the customer name.

use std::sync::Arc;

use async_trait::async_trait;

use agent_core::{Locale, Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema};

use super::{agreement_id, agreement_param, render};
use crate::store::AgreementStore;

pub const NAME: &str = "query_consumption_records";

/// Tool for the consumption history of an agreement
pub struct QueryConsumptionRecordsTool {
    store: Arc<dyn AgreementStore>,
    locale: Locale,
}

impl QueryConsumptionRecordsTool {
    pub fn new(store: Arc<dyn AgreementStore>, locale: Locale) -> Self {
        Self { store, locale }
    }
}

#[async_trait]
impl Tool for QueryConsumptionRecordsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: NAME.into(),
            description: "Look up the consumption history of an agreement number, with the customer name. Returns one row per reading date with the kWh consumed.".into(),
            parameters: vec![agreement_param()],
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let id = agreement_id(call)?;
        let table = self.store.consumption_records(id).await?;
        Ok(render(NAME, self.locale, &["consumos", "maestro"], id, &table))
    }
}
