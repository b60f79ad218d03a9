//! Pseudo-terminal channel for interactive sessions.
//!
//! Spawns the shell invocation under a PTY so the child sees a terminal
//! (unbuffered, interleaved stdout/stderr) and accepts injected input lines.
//! A reader thread forwards raw output chunks over a channel; reading whole
//! lines would never deliver an unfinished prompt, which carries no trailing
//! newline by definition.

use std::io::{Read, Write};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::Duration;

use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};
use tracing::warn;

use super::command::ShellInvocation;
use super::error::SessionError;

/// Exclusive handle to one spawned child and its PTY channel.
///
/// Released exactly once: either by [`wait_exit_code`](Self::wait_exit_code)
/// on natural exit or by [`force_kill`](Self::force_kill) on timeout/error.
pub struct PtyHandle {
    child: Box<dyn Child + Send + Sync>,
    writer: Box<dyn Write + Send>,
    output_rx: Receiver<String>,
    // Keeps the master side open for the lifetime of the session.
    _master: Box<dyn MasterPty + Send>,
}

impl std::fmt::Debug for PtyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtyHandle")
            .field("pid", &self.child.process_id())
            .finish()
    }
}

impl PtyHandle {
    /// Spawn an invocation under a fresh PTY.
    ///
    /// A PTY open failure means the host has no usable pseudo-terminal
    /// facility ([`SessionError::Unavailable`]); a spawn failure means the
    /// command itself could not start ([`SessionError::SpawnFailure`]).
    pub fn spawn(invocation: &ShellInvocation, cwd: Option<&Path>) -> Result<Self, SessionError> {
        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(PtySize {
                rows: 30,
                cols: 100,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| SessionError::Unavailable(e.to_string()))?;

        let mut cmd = CommandBuilder::new(&invocation.program);
        cmd.args(&invocation.args);
        if let Some(dir) = cwd {
            cmd.cwd(dir);
        }

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| SessionError::SpawnFailure(e.to_string()))?;
        drop(pair.slave);

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| SessionError::SpawnFailure(e.to_string()))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|e| SessionError::SpawnFailure(e.to_string()))?;

        let (tx, output_rx) = mpsc::channel();
        thread::spawn(move || {
            let mut reader = reader;
            let mut buf = [0u8; 4096];
            // Multibyte characters and escape sequences can straddle read
            // boundaries; incomplete tails are carried into the next read.
            let mut utf8_carry: Vec<u8> = Vec::new();
            let mut escape_carry = String::new();
            loop {
                match reader.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        utf8_carry.extend_from_slice(&buf[..n]);
                        let mut text = std::mem::take(&mut escape_carry);
                        text.push_str(&drain_complete_utf8(&mut utf8_carry));
                        if let Some(pos) = incomplete_escape_start(&text) {
                            escape_carry = text.split_off(pos);
                        }
                        let chunk = strip_ansi_codes(&text);
                        if !chunk.is_empty() && tx.send(chunk).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
            let mut tail = escape_carry;
            tail.push_str(&String::from_utf8_lossy(&utf8_carry));
            let tail = strip_ansi_codes(&tail);
            if !tail.is_empty() {
                let _ = tx.send(tail);
            }
        });

        Ok(Self {
            child,
            writer,
            output_rx,
            _master: pair.master,
        })
    }

    /// Bounded wait for the next output chunk. `Err(Timeout)` is normal
    /// polling; `Err(Disconnected)` is end-of-stream.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<String, RecvTimeoutError> {
        self.output_rx.recv_timeout(timeout)
    }

    /// Drain a chunk that is already queued, without waiting.
    pub fn try_recv(&self) -> Result<String, TryRecvError> {
        self.output_rx.try_recv()
    }

    /// Write one input line (appends a newline).
    pub fn send_line(&mut self, input: &str) -> std::io::Result<()> {
        self.writer.write_all(input.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }

    /// Wait for the child to exit and return its exit code (0 when the code
    /// is unavailable).
    pub fn wait_exit_code(&mut self) -> i32 {
        match self.child.wait() {
            Ok(status) => status.exit_code() as i32,
            Err(_) => 0,
        }
    }

    /// Force-terminate the child and reap it, releasing the handle.
    pub fn force_kill(&mut self) {
        #[cfg(unix)]
        if let Some(pid) = self.child.process_id() {
            unsafe {
                libc::kill(pid as i32, libc::SIGKILL);
            }
        }
        if let Err(e) = self.child.kill() {
            warn!("failed to kill session child: {e}");
        }
        let _ = self.child.wait();
    }
}

/// Decode the complete UTF-8 prefix of `pending`, leaving an incomplete
/// trailing multibyte sequence behind for the next read. Invalid sequences
/// mid-stream (binary output) decode lossily.
fn drain_complete_utf8(pending: &mut Vec<u8>) -> String {
    match std::str::from_utf8(pending) {
        Ok(s) => {
            let text = s.to_string();
            pending.clear();
            text
        }
        Err(e) if e.error_len().is_none() => {
            let valid = e.valid_up_to();
            let text = String::from_utf8_lossy(&pending[..valid]).into_owned();
            pending.drain(..valid);
            text
        }
        Err(_) => {
            let text = String::from_utf8_lossy(pending).into_owned();
            pending.clear();
            text
        }
    }
}

/// Start offset of an unterminated trailing escape sequence (`ESC` alone or
/// a CSI sequence with no final byte yet), if the text ends in one.
fn incomplete_escape_start(text: &str) -> Option<usize> {
    let start = text.rfind('\x1b')?;
    let rest = &text[start + 1..];
    match rest.chars().next() {
        None => Some(start),
        Some('[') => {
            if rest[1..].chars().any(|c| c.is_ascii_alphabetic()) {
                None
            } else {
                Some(start)
            }
        }
        Some(_) => None,
    }
}

/// Strip ANSI escape sequences and control characters from a chunk, keeping
/// newlines and tabs. Carriage returns are dropped so redrawn lines do not
/// accumulate.
fn strip_ansi_codes(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\x1b' {
            if chars.peek() == Some(&'[') {
                chars.next();
                while let Some(&next) = chars.peek() {
                    chars.next();
                    if next.is_ascii_alphabetic() {
                        break;
                    }
                }
            }
        } else if c == '\r' {
            // Skip carriage return
        } else if c.is_ascii_control() && c != '\n' && c != '\t' {
            // Skip other control characters
        } else {
            result.push(c);
        }
    }

    result
}
