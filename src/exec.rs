//! Plain non-interactive execution.
//!
//! The simpler code path for hosts or callers that do not need prompt
//! handling: buffer the entire output, enforce the deadline, no scanning.
//! Interactive-session requests still go through the engine; this path is
//! also the fallback when no PTY facility exists.

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::session::{build_invocation, RunResult};

const WAIT_GRANULARITY: Duration = Duration::from_millis(200);

/// Run a command to completion, capturing stdout and stderr separately.
/// `timeout_secs <= 0` means no deadline.
pub fn run_plain(command: &str, timeout_secs: i64) -> RunResult {
    let invocation = build_invocation(command, false);

    let mut child = match Command::new(&invocation.program)
        .args(&invocation.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => return RunResult::error(String::new(), e.to_string()),
    };

    let stdout_handle = drain(child.stdout.take());
    let stderr_handle = drain(child.stderr.take());

    let deadline =
        (timeout_secs > 0).then(|| Instant::now() + Duration::from_secs(timeout_secs as u64));

    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    debug!(command, "plain execution deadline elapsed, killing child");
                    let _ = child.kill();
                    let _ = child.wait();
                    let stdout = stdout_handle.join().unwrap_or_default();
                    let mut result =
                        RunResult::error(stdout, format!("Timed out after {timeout_secs}s"));
                    let _ = stderr_handle.join();
                    if let Some(warning) = invocation.rewrite_warning() {
                        result.stderr.push_str("; ");
                        result.stderr.push_str(&warning);
                    }
                    return result;
                }
                thread::sleep(WAIT_GRANULARITY);
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                let stdout = stdout_handle.join().unwrap_or_default();
                let _ = stderr_handle.join();
                return RunResult::error(stdout, e.to_string());
            }
        }
    };

    let stdout = stdout_handle.join().unwrap_or_default();
    let mut stderr = stderr_handle.join().unwrap_or_default();
    if let Some(warning) = invocation.rewrite_warning() {
        if !stderr.is_empty() {
            stderr.push('\n');
        }
        stderr.push_str(&warning);
    }

    RunResult::completed(stdout, stderr, status.code().unwrap_or(-1))
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut output = String::new();
        if let Some(mut pipe) = pipe {
            let mut bytes = Vec::new();
            let _ = pipe.read_to_end(&mut bytes);
            output = String::from_utf8_lossy(&bytes).into_owned();
        }
        output
    })
}
