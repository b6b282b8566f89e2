pub mod initialize;
pub mod setup;

use crate::error::BridgeError;
use crate::project_root::detect_project_root;
use crate::resolver::ExecutableResolver;
use crate::runner::{self, EXIT_CODE_UNAVAILABLE, RunOutput};
use crate::schema::{self, FieldSpec};
use initialize::InitializeRequest;
use serde_json::{Value, json};
use setup::SetupRequest;
use std::path::PathBuf;
use tracing::debug;

/// A validated tool request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToolRequest {
    Setup(SetupRequest),
    Initialize(InitializeRequest),
}

impl ToolRequest {
    pub fn to_args(&self) -> Vec<String> {
        match self {
            Self::Setup(request) => request.to_args(),
            Self::Initialize(request) => request.to_args(),
        }
    }

    pub fn project_root(&self) -> Option<&str> {
        match self {
            Self::Setup(request) => request.project_root.as_deref(),
            Self::Initialize(request) => request.setup.project_root.as_deref(),
        }
    }
}

pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub fields: Vec<FieldSpec>,
    parse: fn(Value) -> serde_json::Result<ToolRequest>,
}

impl ToolSpec {
    pub fn prepare(&self, arguments: Option<&Value>) -> Result<ToolRequest, BridgeError> {
        let arguments =
            schema::as_object(arguments).map_err(|v| BridgeError::ValidationFailed(vec![v]))?;
        let violations = schema::validate(&self.fields, &arguments);
        if !violations.is_empty() {
            return Err(BridgeError::ValidationFailed(violations));
        }
        (self.parse)(Value::Object(arguments))
            .map_err(|e| BridgeError::Internal(format!("validated arguments did not parse: {e}")))
    }

    pub fn definition(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": schema::input_schema(&self.fields)
        })
    }
}

/// Tools exposed over MCP. Built once at startup and only read afterwards.
pub struct ToolRegistry {
    tools: Vec<ToolSpec>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        let mut initialize_fields = initialize::EXTRA_FIELDS.to_vec();
        initialize_fields.extend_from_slice(setup::FIELDS);

        Self {
            tools: vec![
                ToolSpec {
                    name: setup::NAME,
                    description: setup::DESCRIPTION,
                    fields: setup::FIELDS.to_vec(),
                    parse: |value| serde_json::from_value(value).map(ToolRequest::Setup),
                },
                ToolSpec {
                    name: initialize::NAME,
                    description: initialize::DESCRIPTION,
                    fields: initialize_fields,
                    parse: |value| serde_json::from_value(value).map(ToolRequest::Initialize),
                },
            ],
        }
    }

    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolSpec> {
        self.tools.iter()
    }

    pub fn definitions(&self) -> Value {
        Value::Array(self.iter().map(ToolSpec::definition).collect())
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything known about one karasu invocation. Process-level failures
/// live in `result` and are reported inside the tool result.
pub struct ToolOutcome {
    pub command: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub result: Result<RunOutput, BridgeError>,
}

impl ToolOutcome {
    pub fn exit_code(&self) -> i32 {
        match &self.result {
            Ok(_) => 0,
            Err(BridgeError::NonZeroExit { code, .. }) => *code,
            Err(_) => EXIT_CODE_UNAVAILABLE,
        }
    }
}

pub fn call_tool(
    registry: &ToolRegistry,
    resolver: &ExecutableResolver,
    name: &str,
    arguments: Option<&Value>,
) -> Result<ToolOutcome, BridgeError> {
    let tool = registry
        .get(name)
        .ok_or_else(|| BridgeError::ToolNotFound(name.to_owned()))?;
    let request = tool.prepare(arguments)?;
    let args = request.to_args();
    let cwd = match request.project_root() {
        Some(root) => PathBuf::from(root),
        None => detect_project_root(),
    };
    let command = resolver.resolve();
    debug!(tool = name, command = %command.display(), cwd = %cwd.display(), "calling tool");

    let result = runner::run(&command, &args, &cwd, resolver.program());
    if let Ok(output) = &result
        && !output.stderr.is_empty()
    {
        debug!(tool = name, stderr = %output.stderr, "karasu wrote to stderr");
    }
    Ok(ToolOutcome {
        command,
        args,
        cwd,
        result,
    })
}

pub fn render_tool_result(outcome: ToolOutcome) -> Value {
    let exit_code = outcome.exit_code();
    let structured = json!({
        "ok": outcome.result.is_ok(),
        "exit_code": exit_code,
        "command": outcome.command.to_string_lossy(),
        "args": outcome.args,
        "cwd": outcome.cwd.to_string_lossy()
    });

    let (is_error, text) = match outcome.result {
        Ok(output) if output.stdout.is_empty() => {
            (false, "Command completed successfully".to_owned())
        }
        Ok(output) => (false, output.stdout),
        Err(BridgeError::NonZeroExit {
            code,
            stdout,
            stderr,
            ..
        }) => {
            let mut text = if stderr.is_empty() {
                format!("Command failed with exit code {code}")
            } else {
                stderr
            };
            if !stdout.is_empty() {
                text.push_str("\n\n");
                text.push_str(&stdout);
            }
            (true, text)
        }
        Err(err) => (true, err.to_string()),
    };

    json!({
        "isError": is_error,
        "content": [
            {"type": "text", "text": text}
        ],
        "structuredContent": structured
    })
}
