use crate::error::PARSE_ERROR;
use crate::mcp::{Bridge, handle_request};
use crate::protocol::{Framing, Incoming, error_response, read_mcp_message, write_mcp_message};
use crossbeam_channel::{Receiver, bounded};
use serde_json::Value;
use std::io::{self, BufRead, Write};
use std::sync::Mutex;
use std::thread;
use tracing::{debug, error, info, warn};

pub const DEFAULT_WORKERS: usize = 4;

/// `tools/call` runs on a pool of `workers` threads. The reader blocks while
/// the pool and its queue are full.
pub fn serve<R, W>(reader: &mut R, writer: W, bridge: &Bridge, workers: usize) -> io::Result<()>
where
    R: BufRead,
    W: Write + Send,
{
    let writer = Mutex::new(writer);
    let workers = workers.max(1);
    let (calls, queue) = bounded::<(Value, Framing)>(workers);

    thread::scope(|scope| {
        // Owned by the closure so workers see the queue close on any return.
        let calls = calls;
        for worker in 0..workers {
            let queue = queue.clone();
            let writer = &writer;
            scope.spawn(move || run_worker(worker, &queue, writer, bridge));
        }
        drop(queue);

        loop {
            let (message, framing) = match read_mcp_message(reader) {
                Ok(Some(Incoming::Message(message, framing))) => (message, framing),
                Ok(Some(Incoming::Malformed(reason, framing))) => {
                    warn!(error = %reason, "failed to parse MCP message");
                    let response = error_response(Value::Null, PARSE_ERROR, &reason);
                    respond(&writer, &response, framing)?;
                    continue;
                }
                Ok(None) => {
                    info!("stdin closed, shutting down");
                    return Ok(());
                }
                Err(err) => {
                    error!(error = %err, "failed to read MCP message");
                    return Err(err);
                }
            };

            if is_tool_call(&message) {
                calls
                    .send((message, framing))
                    .map_err(|_| io::Error::other("tool call workers stopped"))?;
            } else if let Some(response) = handle_request(&message, bridge) {
                respond(&writer, &response, framing)?;
            }
        }
    })
}

fn run_worker<W: Write>(
    worker: usize,
    queue: &Receiver<(Value, Framing)>,
    writer: &Mutex<W>,
    bridge: &Bridge,
) {
    for (message, framing) in queue.iter() {
        debug!(worker, "picked up tool call");
        if let Some(response) = handle_request(&message, bridge)
            && let Err(err) = respond(writer, &response, framing)
        {
            error!(error = %err, "failed to write tool call response");
        }
    }
}

fn is_tool_call(message: &Value) -> bool {
    message.get("method").and_then(Value::as_str) == Some("tools/call")
}

fn respond<W: Write>(writer: &Mutex<W>, response: &Value, framing: Framing) -> io::Result<()> {
    let mut writer = writer.lock().unwrap_or_else(|e| e.into_inner());
    write_mcp_message(&mut *writer, response, framing)
}
