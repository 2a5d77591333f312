//! External process execution with a deadline
//!
//! Every spawned tool (python, pip, mklink) goes through [`run`], which polls
//! the child until it exits or the timeout passes. stdout is discarded and
//! stderr is spooled to an anonymous temp file so a chatty child cannot block
//! on a full pipe.

use std::io::{Read, Seek, SeekFrom};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{LabError, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Render a command as a single line for messages
pub fn describe(command: &Command) -> String {
    let mut parts = vec![command.get_program().to_string_lossy().into_owned()];
    parts.extend(command.get_args().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
}

/// Run `command` to completion, killing it once `timeout` has elapsed
pub fn run(mut command: Command, timeout: Duration) -> Result<()> {
    let label = describe(&command);
    let program = command.get_program().to_string_lossy().into_owned();
    tracing::debug!(command = %label, ?timeout, "spawning");

    let mut stderr = tempfile::tempfile()?;
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::from(stderr.try_clone()?));

    let mut child = command.spawn().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => LabError::ToolMissing {
            program: program.clone(),
        },
        _ => LabError::Io {
            message: format!("Failed to start '{label}': {e}"),
        },
    })?;

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            if status.success() {
                return Ok(());
            }
            let mut captured = Vec::new();
            stderr.seek(SeekFrom::Start(0))?;
            stderr.read_to_end(&mut captured)?;
            return Err(LabError::CommandFailed {
                command: label,
                status: status.to_string(),
                stderr: String::from_utf8_lossy(&captured).trim().to_string(),
            });
        }

        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            tracing::warn!(command = %label, "killed after timeout");
            return Err(LabError::OperationTimedOut {
                operation: label,
                timeout,
            });
        }

        thread::sleep(POLL_INTERVAL);
    }
}
