use crate::schema::FieldViolation;
use std::io;
use thiserror::Error;

pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;
pub const PARSE_ERROR: i64 = -32700;

/// Every way a single tool call can fail.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Invalid parameters: {}", render_violations(.0))]
    ValidationFailed(Vec<FieldViolation>),

    #[error("Unknown tool: {0}")]
    ToolNotFound(String),

    #[error(
        "{program} not found. Install it with `pipx install {program}`, \
         `uv tool install {program}` or `pip install {program}`, \
         or pass its location with --executable."
    )]
    ExecutableNotFound { program: String },

    #[error("Failed to run {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with code {code}")]
    NonZeroExit {
        program: String,
        code: i32,
        stdout: String,
        stderr: String,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    /// JSON-RPC error code when this error is answered at the protocol level.
    /// Process failures are normally reported inside a tool result.
    pub fn rpc_code(&self) -> i64 {
        match self {
            Self::ValidationFailed(_) => INVALID_PARAMS,
            Self::ToolNotFound(_) => METHOD_NOT_FOUND,
            Self::Internal(_)
            | Self::ExecutableNotFound { .. }
            | Self::SpawnFailed { .. }
            | Self::NonZeroExit { .. } => INTERNAL_ERROR,
        }
    }

}

fn render_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
