//! # Tool Facade
//!
//! The six-operation tool contract exposed to agent hosts:
//! `clear_model`, `add_item`, `delete_item`, `replace_item`, `get_model`, `solve_model`.
//!
//! Every operation acts on a `Session` supplied by the host and reports
//! failures as a structured `ToolError { code, message }`. `dispatch` is the
//! JSON surface: it validates arguments, routes, and never panics.

use crate::model::{AddOutcome, ItemSpec, ItemView};
use crate::orchestrator::{SolveOptions, SolveOrchestrator};
use crate::session::Session;
use crate::{SolverError, SolverResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Names of the tools, in contract order.
pub const TOOL_NAMES: [&str; 6] = [
    "clear_model",
    "add_item",
    "delete_item",
    "replace_item",
    "get_model",
    "solve_model",
];

const INVALID_ARGUMENTS: &str = "invalid_arguments";
const UNKNOWN_TOOL: &str = "unknown_tool";

// =============================================================================
// ERRORS
// =============================================================================

/// Structured failure payload of a tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{code}: {message}")]
pub struct ToolError {
    pub code: String,
    pub message: String,
}

impl ToolError {
    #[must_use]
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl From<SolverError> for ToolError {
    fn from(error: SolverError) -> Self {
        Self::new(error.code(), error.to_string())
    }
}

pub type ToolResult<T> = Result<T, ToolError>;

// =============================================================================
// REQUESTS & RESPONSES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddItemRequest {
    pub item: ItemSpec,
    #[serde(default)]
    pub index: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteItemRequest {
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplaceItemRequest {
    pub index: usize,
    pub item: ItemSpec,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct NoArguments {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearResponse {
    pub cleared: bool,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteItemResponse {
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceItemResponse {
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelResponse {
    pub count: usize,
    pub items: Vec<ItemView>,
}

/// JSON envelope returned by `dispatch`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolReply {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolError>,
}

impl From<ToolResult<Value>> for ToolReply {
    fn from(outcome: ToolResult<Value>) -> Self {
        match outcome {
            Ok(result) => Self {
                ok: true,
                result: Some(result),
                error: None,
            },
            Err(error) => Self {
                ok: false,
                result: None,
                error: Some(error),
            },
        }
    }
}

// =============================================================================
// FACADE
// =============================================================================

/// The tool contract over a shared orchestrator.
#[derive(Debug, Clone)]
pub struct ToolFacade {
    orchestrator: Arc<SolveOrchestrator>,
}

impl ToolFacade {
    #[must_use]
    pub fn new(orchestrator: Arc<SolveOrchestrator>) -> Self {
        Self { orchestrator }
    }

    #[must_use]
    pub fn orchestrator(&self) -> &SolveOrchestrator {
        &self.orchestrator
    }

    /// Reset the session's model to empty. Never fails.
    pub fn clear_model(&self, session: &Session) -> ToolResult<ClearResponse> {
        tracing::debug!(session = %session.id(), tool = "clear_model");
        let count = session.clear_model();
        Ok(ClearResponse {
            cleared: true,
            count,
        })
    }

    pub fn add_item(&self, session: &Session, request: AddItemRequest) -> ToolResult<AddOutcome> {
        tracing::debug!(session = %session.id(), tool = "add_item", index = ?request.index);
        let outcome = request
            .item
            .into_item()
            .and_then(|item| session.add_item(item, request.index));
        report(session, "add_item", outcome)
    }

    pub fn delete_item(
        &self,
        session: &Session,
        request: DeleteItemRequest,
    ) -> ToolResult<DeleteItemResponse> {
        tracing::debug!(session = %session.id(), tool = "delete_item", index = request.index);
        let outcome = session
            .delete_item(request.index)
            .map(|count| DeleteItemResponse { count });
        report(session, "delete_item", outcome)
    }

    pub fn replace_item(
        &self,
        session: &Session,
        request: ReplaceItemRequest,
    ) -> ToolResult<ReplaceItemResponse> {
        tracing::debug!(session = %session.id(), tool = "replace_item", index = request.index);
        let outcome = request
            .item
            .into_item()
            .and_then(|item| session.replace_item(request.index, item))
            .map(|index| ReplaceItemResponse { index });
        report(session, "replace_item", outcome)
    }

    /// Read-only view of the model. Never fails.
    pub fn get_model(&self, session: &Session) -> ToolResult<ModelResponse> {
        tracing::debug!(session = %session.id(), tool = "get_model");
        let snapshot = session.get_model();
        Ok(ModelResponse {
            count: snapshot.len(),
            items: snapshot.views(),
        })
    }

    pub fn solve_model(&self, session: &Session, options: SolveOptions) -> ToolResult<SolverResult> {
        tracing::debug!(session = %session.id(), tool = "solve_model", ?options);
        let outcome = session.solve_with(&self.orchestrator, &options);
        report(session, "solve_model", outcome)
    }

    /// Route a JSON tool call. `null` arguments count as `{}`.
    pub fn dispatch(&self, session: &Session, tool: &str, args: Value) -> ToolReply {
        let args = if args.is_null() {
            Value::Object(serde_json::Map::new())
        } else {
            args
        };

        let outcome = match tool {
            "clear_model" => {
                parse::<NoArguments>(args).and_then(|_| encode(self.clear_model(session)))
            }
            "add_item" => parse(args).and_then(|req| encode(self.add_item(session, req))),
            "delete_item" => parse(args).and_then(|req| encode(self.delete_item(session, req))),
            "replace_item" => parse(args).and_then(|req| encode(self.replace_item(session, req))),
            "get_model" => {
                parse::<NoArguments>(args).and_then(|_| encode(self.get_model(session)))
            }
            "solve_model" => parse(args).and_then(|opts| encode(self.solve_model(session, opts))),
            other => {
                tracing::warn!(session = %session.id(), tool = other, "unknown tool");
                Err(ToolError::new(
                    UNKNOWN_TOOL,
                    format!("unknown tool '{other}' (expected one of {})", TOOL_NAMES.join(", ")),
                ))
            }
        };
        ToolReply::from(outcome)
    }
}

fn report<T>(session: &Session, tool: &str, outcome: Result<T, SolverError>) -> ToolResult<T> {
    outcome.map_err(|e| {
        tracing::warn!(session = %session.id(), tool, code = e.code(), error = %e, "tool call failed");
        ToolError::from(e)
    })
}

fn parse<T: DeserializeOwned>(args: Value) -> ToolResult<T> {
    serde_json::from_value(args)
        .map_err(|e| ToolError::new(INVALID_ARGUMENTS, format!("invalid arguments: {e}")))
}

fn encode<T: Serialize>(outcome: ToolResult<T>) -> ToolResult<Value> {
    outcome.and_then(|value| {
        serde_json::to_value(value)
            .map_err(|e| ToolError::new("solver_error", format!("failed to encode result: {e}")))
    })
}

// =============================================================================
// TESTS
// =============================================================================
