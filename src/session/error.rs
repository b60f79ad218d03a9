//! Error taxonomy for the session engine.
//!
//! A failed resolution (no auto-response available) is deliberately not an
//! error: it surfaces as the `need_input` status so a human or the caller's
//! own logic can answer. Nothing here is retried inside the engine.

/// Fatal session failures.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The child process could not start; the session is never registered.
    #[error("failed to spawn interactive session: {0}")]
    SpawnFailure(String),

    /// The child I/O channel broke mid-session; the session is destroyed.
    #[error("session I/O failed: {0}")]
    ReadFailure(String),

    /// The caller deadline elapsed; the child was force-terminated.
    #[error("Timed out after {0}s")]
    Timeout(i64),

    /// A continuation call referenced a missing or expired session id.
    #[error("session not found: {0}")]
    UnknownSession(u64),

    /// No pseudo-terminal facility is available on this host. Plain
    /// non-interactive execution still works through the simpler code path.
    #[error("interactive mode unavailable: {0}")]
    Unavailable(String),
}
