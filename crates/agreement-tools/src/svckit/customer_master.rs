//! Customer Master Tool
//!
//! Looks up the master record (`maestro`) of an agreement.

use std::sync::Arc;

use async_trait::async_trait;

use agent_core::{Locale, Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema};

use super::{agreement_id, agreement_param, render};
use crate::store::AgreementStore;

pub const NAME: &str = "query_customer_master";

/// Tool for the customer record of an agreement
pub struct QueryCustomerMasterTool {
    store: Arc<dyn AgreementStore>,
    locale: Locale,
}

impl QueryCustomerMasterTool {
    pub fn new(store: Arc<dyn AgreementStore>, locale: Locale) -> Self {
        Self { store, locale }
    }
}

#[async_trait]
impl Tool for QueryCustomerMasterTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: NAME.into(),
            description: "Look up the customer information for an agreement number. Returns every field of the customer master record.".into(),
            parameters: vec![agreement_param()],
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let id = agreement_id(call)?;
        let table = self.store.customer_master(id).await?;
        Ok(render(NAME, self.locale, &["maestro"], id, &table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use agent_core::{AgentError, ToolOutcome};

    fn tool(store: MemoryStore) -> QueryCustomerMasterTool {
        QueryCustomerMasterTool::new(Arc::new(store), Locale::En)
    }

    fn call(id: &str) -> ToolCall {
        ToolCall::new(NAME).with_arg("agreement_id", id)
    }

    #[tokio::test]
    async fn test_found() {
        let tool = tool(MemoryStore::new().with_customer("A100", "Ana Ruiz", "PS-1"));
        let result = tool.execute(&call("A100")).await.unwrap();

        assert_eq!(result.outcome, ToolOutcome::Found);
        assert!(result.output.starts_with("Source: maestro\n"));
        assert!(result.output.contains("| A100       | Ana Ruiz       | PS-1              |"));
    }

    #[tokio::test]
    async fn test_not_found_is_exact() {
        let tool = tool(MemoryStore::new());
        let result = tool.execute(&call("ZZZ")).await.unwrap();

        assert_eq!(result.outcome, ToolOutcome::NotFound);
        assert_eq!(result.output, "No information found for agreement ZZZ.");
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let tool = tool(MemoryStore::new().offline());
        let err = tool.execute(&call("A100")).await.unwrap_err();
        assert!(matches!(err, AgentError::ToolExecution(_)));
    }
}
