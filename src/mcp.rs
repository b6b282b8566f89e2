use crate::error::{BridgeError, INVALID_REQUEST, METHOD_NOT_FOUND};
use crate::protocol::{error_response, error_response_with_data, success_response};
use crate::resolver::ExecutableResolver;
use crate::tools::{ToolRegistry, call_tool, render_tool_result};
use serde_json::{Value, json};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "karasu-mcp";

pub struct Bridge {
    registry: ToolRegistry,
    resolver: ExecutableResolver,
}

impl Bridge {
    pub fn new(registry: ToolRegistry, resolver: ExecutableResolver) -> Self {
        Self { registry, resolver }
    }
}

/// Notifications (no `id`) get `None`.
pub fn handle_request(request: &Value, bridge: &Bridge) -> Option<Value> {
    let id = request.get("id")?.clone();
    let Some(method) = request.get("method").and_then(Value::as_str) else {
        return Some(error_response(id, INVALID_REQUEST, "Missing method"));
    };
    let params = request.get("params");
    debug!(method, %id, "handling request");

    match method {
        "initialize" => {
            let client_protocol = params
                .and_then(|v| v.get("protocolVersion"))
                .and_then(Value::as_str)
                .unwrap_or(PROTOCOL_VERSION);

            Some(success_response(
                id,
                json!({
                    "protocolVersion": client_protocol,
                    "capabilities": {
                        "tools": {
                            "listChanged": false
                        }
                    },
                    "serverInfo": {
                        "name": SERVER_NAME,
                        "version": env!("CARGO_PKG_VERSION")
                    }
                }),
            ))
        }
        "ping" => Some(success_response(id, json!({}))),
        "tools/list" => Some(success_response(
            id,
            json!({
                "tools": bridge.registry.definitions()
            }),
        )),
        "tools/call" => Some(handle_tools_call(id, params, bridge)),
        _ => Some(error_response(id, METHOD_NOT_FOUND, "Method not found")),
    }
}

fn handle_tools_call(id: Value, params: Option<&Value>, bridge: &Bridge) -> Value {
    let name = params
        .and_then(|v| v.get("name"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    let arguments = params
        .and_then(|v| v.get("arguments"))
        .filter(|v| !v.is_null());

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        call_tool(&bridge.registry, &bridge.resolver, name, arguments)
    }))
    .unwrap_or_else(|payload| Err(BridgeError::Internal(panic_message(payload.as_ref()))));

    match result {
        Ok(outcome) => {
            if let Err(err) = &outcome.result {
                warn!(tool = name, exit_code = outcome.exit_code(), error = %err, "tool call failed");
            }
            success_response(id, render_tool_result(outcome))
        }
        Err(err) => {
            warn!(tool = name, error = %err, "tool call rejected");
            error_for(id, err)
        }
    }
}

fn error_for(id: Value, err: BridgeError) -> Value {
    let message = err.to_string();
    let code = err.rpc_code();
    match err {
        BridgeError::ValidationFailed(violations) => {
            let violations = violations.iter().map(|v| v.to_json()).collect::<Vec<_>>();
            error_response_with_data(id, code, &message, json!({ "violations": violations }))
        }
        _ => error_response(id, code, &message),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "tool call panicked".to_owned()
    }
}
