use crate::error::BridgeError;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Exit code recorded when the process produced none: killed by a signal,
/// or never started.
pub const EXIT_CODE_UNAVAILABLE: i32 = -1;

/// Trimmed output of a run that exited with code 0.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunOutput {
    pub stdout: String,
    pub stderr: String,
}

/// A nonzero exit is [`BridgeError::NonZeroExit`] with the captured output.
pub fn run(
    command: &Path,
    args: &[String],
    cwd: &Path,
    program: &str,
) -> Result<RunOutput, BridgeError> {
    spawn_and_wait(command, args, cwd, program).inspect_err(|err| {
        if !matches!(err, BridgeError::NonZeroExit { .. }) {
            warn!(command = %command.display(), error = %err, "failed to start process");
        }
    })
}

fn spawn_and_wait(
    command: &Path,
    args: &[String],
    cwd: &Path,
    program: &str,
) -> Result<RunOutput, BridgeError> {
    // Spawning into a missing directory reports NotFound too, which would
    // otherwise be mistaken for a missing executable.
    if !cwd.is_dir() {
        return Err(BridgeError::SpawnFailed {
            program: program.to_owned(),
            source: io::Error::new(
                io::ErrorKind::NotFound,
                format!("working directory does not exist: {}", cwd.display()),
            ),
        });
    }

    debug!(command = %command.display(), ?args, cwd = %cwd.display(), "spawning");
    let output = Command::new(command)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                BridgeError::ExecutableNotFound {
                    program: program.to_owned(),
                }
            } else {
                BridgeError::SpawnFailed {
                    program: program.to_owned(),
                    source,
                }
            }
        })?;

    let exit_code = output.status.code().unwrap_or(EXIT_CODE_UNAVAILABLE);
    debug!(exit_code, "process exited");
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
    if exit_code != 0 {
        return Err(BridgeError::NonZeroExit {
            program: program.to_owned(),
            code: exit_code,
            stdout,
            stderr,
        });
    }
    Ok(RunOutput { stdout, stderr })
}
