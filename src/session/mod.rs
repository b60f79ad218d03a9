//! Interactive shell-session engine.
//!
//! Runs a command under a pseudo-terminal, incrementally scans its output
//! for input prompts it has never seen before, auto-answers them from a
//! caller-supplied response plan, or suspends and hands control back to the
//! caller pending a human answer - with resumable multi-call sessions and
//! idle-based prompt detection (no reliable end-of-prompt marker exists).
//!
//! # Architecture
//!
//! - **[`scanner`]** - pure text analysis: finds and classifies candidate
//!   prompt substrings in an output buffer.
//! - **[`ResponseSource`]** - the resolver: ordered answer queue or keyed
//!   lookup table, with repeat-prompt handling.
//! - **[`ShellSession`]** - per-session mutable record: child handle,
//!   rolling scan buffer, pending-prompt slot, timing fields.
//! - **`run_loop`** - the state machine driving one session to completion,
//!   timeout, or a need-input pause.
//! - **[`SessionRegistry`]** - map from session id to paused sessions,
//!   owned by the engine.
//! - **[`ShellEngine`]** - the entry point gluing it all together.

mod command;
mod engine;
mod error;
mod events;
mod pty;
mod registry;
mod resolver;
mod result;
mod run_loop;
pub mod scanner;
mod state;

pub use command::{build_invocation, ShellInvocation};
pub use engine::{RunRequest, ShellEngine};
pub use error::SessionError;
pub use events::{NullObserver, SessionEvent, SessionObserver, StdoutObserver};
pub use pty::PtyHandle;
pub use registry::SessionRegistry;
pub use resolver::ResponseSource;
pub use result::{RunResult, RunStatus};
pub use state::{PendingPrompt, ShellSession};
