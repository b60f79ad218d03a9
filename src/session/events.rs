//! Streaming side-channel for session progress.
//!
//! The engine reports structured events to an injectable observer; this is
//! its only coupling to any UI and stays a plain callback interface. The
//! default observer writes human-readable lines to standard output.

use super::result::RunStatus;

/// One structured event emitted while a session runs.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Start { command: String },
    Output { chunk: String },
    Send { input: String },
    Pause { prompt: String },
    End { status: RunStatus, returncode: i32 },
    Info { message: String },
}

/// Receives session events. Implementations must be cheap and non-blocking;
/// the run loop calls them inline.
pub trait SessionObserver: Send + Sync {
    fn emit(&self, session_id: u64, event: &SessionEvent);
}

/// Default observer: prints to stdout.
pub struct StdoutObserver;

impl SessionObserver for StdoutObserver {
    fn emit(&self, session_id: u64, event: &SessionEvent) {
        match event {
            SessionEvent::Start { command } => {
                println!("[session {session_id}] start: {command}");
            }
            SessionEvent::Output { chunk } => {
                print!("{chunk}");
            }
            SessionEvent::Send { input } => {
                println!("[session {session_id}] send: {input}");
            }
            SessionEvent::Pause { prompt } => {
                println!("[session {session_id}] waiting for input: {prompt}");
            }
            SessionEvent::End { status, returncode } => {
                println!("[session {session_id}] end: {status:?} ({returncode})");
            }
            SessionEvent::Info { message } => {
                println!("[session {session_id}] {message}");
            }
        }
    }
}

/// Observer that drops every event. Used by embedders that only want the
/// final result, and by tests.
pub struct NullObserver;

impl SessionObserver for NullObserver {
    fn emit(&self, _session_id: u64, _event: &SessionEvent) {}
}
