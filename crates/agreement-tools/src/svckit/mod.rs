//! Service Kit - Agent Tools
//!
//! The three agreement lookups, implemented as `agent_core::Tool`.
//! Every result is either a source line followed by a markdown table, or
//! exactly the not-found sentence for the requested agreement.

mod consumption_records;
mod customer_master;
mod field_activities;

pub use consumption_records::QueryConsumptionRecordsTool;
pub use customer_master::QueryCustomerMasterTool;
pub use field_activities::QueryFieldActivitiesTool;

use agent_core::tool::ParameterSchema;
use agent_core::{AgentError, Locale, Result as CoreResult, ToolCall, ToolResult};

use crate::model::Table;
use crate::phrases;

pub const AGREEMENT_ID: &str = "agreement_id";

fn agreement_param() -> ParameterSchema {
    ParameterSchema::required_string(AGREEMENT_ID, "Agreement number (id_acuerdo), for example 'A100'")
}

fn agreement_id(call: &ToolCall) -> CoreResult<&str> {
    call.str_arg(AGREEMENT_ID)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AgentError::ToolValidation(format!("{}: missing {AGREEMENT_ID}", call.name)))
}

/// Turn a lookup result into tool output
fn render(tool: &str, locale: Locale, tables: &[&str], agreement_id: &str, table: &Table) -> ToolResult {
    if table.is_empty() {
        tracing::debug!(tool, agreement_id, "No rows");
        return ToolResult::not_found(tool, phrases::not_found(locale, agreement_id));
    }
    tracing::debug!(tool, agreement_id, rows = table.len(), "Rows found");
    ToolResult::found(
        tool,
        format!("{}\n{}", phrases::source_line(locale, tables), table.to_markdown()),
    )
}
