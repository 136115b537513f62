//! Field Activities Tool

use std::sync::Arc;

use async_trait::async_trait;

use agent_core::{Locale, Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema};

use super::{agreement_id, agreement_param, render};
use crate::store::AgreementStore;

pub const NAME: &str = "query_field_activities";

/// Tool for the field work done at an agreement's service point
pub struct QueryFieldActivitiesTool {
    store: Arc<dyn AgreementStore>,
    locale: Locale,
}

impl QueryFieldActivitiesTool {
    pub fn new(store: Arc<dyn AgreementStore>, locale: Locale) -> Self {
        Self { store, locale }
    }
}

#[async_trait]
impl Tool for QueryFieldActivitiesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: NAME.into(),
            description: "Look up the field activities for an agreement number, joined through its service point. Returns each activity description and date.".into(),
            parameters: vec![agreement_param()],
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let id = agreement_id(call)?;
        let table = self.store.field_activities(id).await?;
        Ok(render(NAME, self.locale, &["actividades", "maestro"], id, &table))
    }
}
