//! Result shape returned to the tool-dispatch layer.

use serde::Serialize;

/// Terminal state of one engine call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The child exited on its own.
    Completed,
    /// Spawn/read failure, timeout, or unknown session.
    Error,
    /// A prompt has no auto-response; the session stays alive in the
    /// registry until a later call supplies input.
    NeedInput,
}

/// Outcome of one `run` call.
///
/// `stdout` always carries the full accumulated output, including partial
/// progress before a failure - callers never lose output. `returncode` is
/// `-1` for every non-completed state.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub stdout: String,
    /// Diagnostic text only; empty on a clean success.
    pub stderr: String,
    pub returncode: i32,
    pub status: RunStatus,
    /// Present only when `status == NeedInput`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Present only when `status == NeedInput`.
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<u64>,
}

impl RunResult {
    pub fn completed(stdout: String, stderr: String, returncode: i32) -> Self {
        Self {
            stdout,
            stderr,
            returncode,
            status: RunStatus::Completed,
            prompt: None,
            session_id: None,
        }
    }

    pub fn error(stdout: String, diagnostic: impl Into<String>) -> Self {
        Self {
            stdout,
            stderr: diagnostic.into(),
            returncode: -1,
            status: RunStatus::Error,
            prompt: None,
            session_id: None,
        }
    }

    pub fn need_input(stdout: String, stderr: String, prompt: String, session_id: u64) -> Self {
        Self {
            stdout,
            stderr,
            returncode: -1,
            status: RunStatus::NeedInput,
            prompt: Some(prompt),
            session_id: Some(session_id),
        }
    }
}
