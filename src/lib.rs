//! Shellmate - interactive shell-session engine.
//!
//! Shellmate runs commands under a pseudo-terminal, watches their output for
//! input prompts, and either answers them automatically from a supplied
//! response plan or suspends and returns control to the caller until a human
//! provides the answer. Paused sessions survive across calls, so a single
//! command can be driven through an arbitrary number of prompts.
//!
//! ## Two execution paths
//!
//! 1. **Interactive** ([`ShellEngine`]): PTY-backed, with incremental prompt
//!    scanning, idle-based detection of prompts the grammar misses, and
//!    resumable sessions.
//!
//! 2. **Plain** ([`exec::run_plain`]): buffer-everything execution with a
//!    deadline, for commands that never ask questions, and the fallback when
//!    a host has no PTY facility.

pub mod config;
pub mod exec;
pub mod session;

pub use config::EngineConfig;
pub use session::{
    ResponseSource, RunRequest, RunResult, RunStatus, SessionError, SessionEvent, SessionObserver,
    ShellEngine,
};
