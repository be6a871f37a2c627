//! # Veriform MCP Server
//!
//! Implements `ServerHandler` with the six model tools, each backed by the
//! session this connection owns.

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use veriform_core::{Session, ToolFacade, ToolReply};

// =============================================================================
// MCP SERVER
// =============================================================================

/// MCP server over one veriform session.
#[derive(Clone)]
pub struct VeriformMcp {
    facade: ToolFacade,
    session: Arc<Session>,
    #[allow(dead_code)]
    tool_router: ToolRouter<Self>,
}

// =============================================================================
// TOOL PARAMETER STRUCTS
// =============================================================================

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AddItemParams {
    /// The item: text such as "x: int" or "x + y <= 10", or a structured object.
    #[schemars(
        description = "The item: text such as 'x: int' or 'x + y <= 10', or a structured object"
    )]
    pub item: Value,
    /// Insert position (default: append).
    #[schemars(description = "Insert position (default: append)")]
    pub index: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct DeleteItemParams {
    /// Index of the item to remove.
    #[schemars(description = "Index of the item to remove")]
    pub index: usize,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ReplaceItemParams {
    /// Index of the item to replace.
    #[schemars(description = "Index of the item to replace")]
    pub index: usize,
    /// The new item, in the same forms `add_item` accepts.
    #[schemars(description = "The new item, in the same forms add_item accepts")]
    pub item: Value,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SolveParams {
    /// Time bound in milliseconds (default from configuration).
    #[schemars(description = "Time bound in milliseconds (default from configuration)")]
    pub timeout_ms: Option<u64>,
    /// Backend name, e.g. 'smtlib' or 'interval'.
    #[schemars(description = "Backend name, e.g. 'smtlib' or 'interval'")]
    pub backend: Option<String>,
    /// Report UNSAT as an error instead of a status.
    #[schemars(description = "Report UNSAT as an error instead of a status")]
    pub strict: Option<bool>,
}

// =============================================================================
// TOOL IMPLEMENTATIONS
// =============================================================================

#[tool_router]
impl VeriformMcp {
    pub fn new(facade: ToolFacade, session: Arc<Session>) -> Self {
        Self {
            facade,
            session,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Remove every item from the model")]
    async fn clear_model(&self) -> Result<CallToolResult, McpError> {
        self.call("clear_model", Value::Null).await
    }

    #[tool(description = "Add a declaration or assertion to the model")]
    async fn add_item(&self, params: Parameters<AddItemParams>) -> Result<CallToolResult, McpError> {
        self.call("add_item", arguments(&params.0)?).await
    }

    #[tool(description = "Delete the item at an index; later items shift down")]
    async fn delete_item(
        &self,
        params: Parameters<DeleteItemParams>,
    ) -> Result<CallToolResult, McpError> {
        self.call("delete_item", arguments(&params.0)?).await
    }

    #[tool(description = "Replace the item at an index; no other item moves")]
    async fn replace_item(
        &self,
        params: Parameters<ReplaceItemParams>,
    ) -> Result<CallToolResult, McpError> {
        self.call("replace_item", arguments(&params.0)?).await
    }

    #[tool(description = "List the model's items in order")]
    async fn get_model(&self) -> Result<CallToolResult, McpError> {
        self.call("get_model", Value::Null).await
    }

    #[tool(description = "Check the model for satisfiability and return a witness or conflict")]
    async fn solve_model(&self, params: Parameters<SolveParams>) -> Result<CallToolResult, McpError> {
        self.call("solve_model", arguments(&params.0)?).await
    }
}

impl VeriformMcp {
    /// Run one tool on a blocking thread and wrap its reply.
    async fn call(&self, tool: &'static str, args: Value) -> Result<CallToolResult, McpError> {
        let facade = self.facade.clone();
        let session = Arc::clone(&self.session);
        let reply = tokio::task::spawn_blocking(move || facade.dispatch(&session, tool, args))
            .await
            .map_err(|e| McpError::internal_error(format!("{tool} did not complete: {e}"), None))?;
        render(reply)
    }
}

// =============================================================================
// SERVER HANDLER
// =============================================================================

#[tool_handler]
impl ServerHandler for VeriformMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Veriform constraint-model server. Build a model with add_item, \
                 delete_item and replace_item, inspect it with get_model, and \
                 check it with solve_model."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// =============================================================================
// RESPONSE FORMATTING
// =============================================================================

fn arguments(params: &impl Serialize) -> Result<Value, McpError> {
    serde_json::to_value(params)
        .map_err(|e| McpError::invalid_params(format!("cannot encode arguments: {e}"), None))
}

/// Successful replies carry the result JSON; failures carry `{code, message}`.
fn render(reply: ToolReply) -> Result<CallToolResult, McpError> {
    let (ok, payload) = match (reply.result, reply.error) {
        (Some(result), None) => (true, result),
        (_, Some(error)) => (false, serde_json::json!(error)),
        (None, None) => (reply.ok, Value::Null),
    };
    let text = serde_json::to_string_pretty(&payload)
        .map_err(|e| McpError::internal_error(format!("cannot encode reply: {e}"), None))?;
    if ok {
        Ok(CallToolResult::success(vec![Content::text(text)]))
    } else {
        Ok(CallToolResult::error(vec![Content::text(text)]))
    }
}

// =============================================================================
// TESTS
// =============================================================================
