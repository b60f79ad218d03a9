//! The polling state machine driving one session.
//!
//! Each iteration: check the caller deadline, then wait (bounded, ~0.2s
//! granularity) for child output. New output is appended and scanned for
//! prompts; end-of-stream completes the session; a quiet tick either
//! resolves a pending prompt (auto-answer or suspend) or evaluates the
//! idle-timeout fallback. The loop is synchronous and blocking from the
//! caller's perspective - there is no background polling between calls.

use std::sync::mpsc::{RecvTimeoutError, TryRecvError};
use std::time::Instant;

use tracing::{debug, warn};

use super::error::SessionError;
use super::events::{SessionEvent, SessionObserver};
use super::scanner;
use super::state::ShellSession;
use crate::config::EngineConfig;

/// How one drive of the loop ended. `NeedInput` leaves the session alive;
/// everything else destroys it.
#[derive(Debug)]
pub(crate) enum LoopOutcome {
    Completed { returncode: i32 },
    NeedInput { prompt: String },
    TimedOut,
    Failed { message: String },
}

pub(crate) struct RunLoop<'a> {
    config: &'a EngineConfig,
    observer: &'a dyn SessionObserver,
}

impl<'a> RunLoop<'a> {
    pub(crate) fn new(config: &'a EngineConfig, observer: &'a dyn SessionObserver) -> Self {
        Self { config, observer }
    }

    /// Drive `session` until the child exits, the deadline elapses, a read
    /// fails, or a prompt needs a human answer.
    pub(crate) fn drive(
        &self,
        session: &mut ShellSession,
        deadline: Option<Instant>,
    ) -> LoopOutcome {
        loop {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    debug!(session_id = session.id, "deadline elapsed, killing child");
                    session.child.force_kill();
                    return LoopOutcome::TimedOut;
                }
            }

            match session.child.recv_timeout(self.config.poll_interval()) {
                Ok(chunk) => {
                    self.ingest(session, chunk);
                    // Output often arrives in rapid bursts; drain what is
                    // already queued before attempting prompt detection.
                    loop {
                        match session.child.try_recv() {
                            Ok(more) => self.ingest(session, more),
                            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
                        }
                    }
                    self.scan_new_output(session);
                }
                Err(RecvTimeoutError::Disconnected) => {
                    let returncode = session.child.wait_exit_code();
                    debug!(session_id = session.id, returncode, "child exited");
                    return LoopOutcome::Completed { returncode };
                }
                Err(RecvTimeoutError::Timeout) => {
                    if session.pending_prompt.is_some() {
                        match self.answer_pending(session) {
                            Some(outcome) => return outcome,
                            None => continue,
                        }
                    }
                    self.idle_fallback(session);
                }
            }
        }
    }

    fn ingest(&self, session: &mut ShellSession, chunk: String) {
        self.observer
            .emit(session.id, &SessionEvent::Output { chunk: chunk.clone() });
        session.append_output(&chunk);
    }

    /// Scan freshly appended output for a prompt. Only the rightmost match
    /// that classifies as a prompt becomes pending; earlier matches in the
    /// same pass are superseded noise.
    fn scan_new_output(&self, session: &mut ShellSession) {
        let from = session.scan_pos;
        session.scan_pos = session.scan_buffer.len();
        self.detect_prompt(session, from);
    }

    fn detect_prompt(&self, session: &mut ShellSession, from: usize) -> bool {
        let last_response = session.last_response.clone().unwrap_or_default();
        let matches = scanner::scan(&session.scan_buffer, from);
        for candidate in matches.iter().rev() {
            let label = scanner::clean_prompt_label(&candidate.raw_label, &last_response);
            if scanner::is_prompt_label(&label) {
                let key = scanner::normalize_key(&label);
                let text = candidate.prompt_text(&label);
                debug!(session_id = session.id, prompt = %text, "prompt detected");
                session.note_prompt(key, text);
                return true;
            }
        }
        false
    }

    /// Consult the resolver for the pending prompt. Returns `Some(outcome)`
    /// to stop the loop, `None` to keep polling after an auto-answer.
    fn answer_pending(&self, session: &mut ShellSession) -> Option<LoopOutcome> {
        let pending = session.pending_prompt.clone()?;

        let answer = session.response_source.as_mut().and_then(|source| {
            source.resolve(
                &pending.key,
                &pending.text,
                session.repeat_count,
                session.last_response.as_deref(),
            )
        });

        match answer {
            Some(value) => {
                self.observer
                    .emit(session.id, &SessionEvent::Send { input: value.clone() });
                if let Err(e) = session.child.send_line(&value) {
                    warn!(session_id = session.id, "failed to write input: {e}");
                    session.child.force_kill();
                    return Some(LoopOutcome::Failed {
                        message: SessionError::ReadFailure(e.to_string()).to_string(),
                    });
                }
                session.mark_sent(&value);
                None
            }
            None => {
                self.observer.emit(
                    session.id,
                    &SessionEvent::Pause {
                        prompt: pending.text.clone(),
                    },
                );
                Some(LoopOutcome::NeedInput {
                    prompt: pending.text,
                })
            }
        }
    }

    /// Many interactive programs repaint or partially draw a prompt the
    /// strict grammar does not match (a bare `> ` tail). Sustained silence
    /// after *some* known prompting behavior is treated as evidence of an
    /// unrecognized prompt: re-scan everything printed since the last send
    /// in case a match was missed, then synthesize a prompt from the last
    /// prompt-like tail line, then fall back to the last recognized prompt.
    /// Both guesses are held off while `awaiting_prompt` is armed (input
    /// sent, no output back yet). If nothing usable exists, keep polling
    /// rather than guessing.
    fn idle_fallback(&self, session: &mut ShellSession) {
        if !session.saw_prompt {
            return;
        }
        let idle = self.config.idle_timeout();
        if session.last_output_time.elapsed() < idle || session.last_send_time.elapsed() < idle {
            return;
        }

        if self.detect_prompt(session, session.send_scan_pos) {
            return;
        }

        // Input was sent and nothing has come back yet: the child is still
        // consuming the answered prompt, and the buffer tail is that same
        // prompt. Synthesizing or reusing here would re-answer it.
        if session.awaiting_prompt {
            return;
        }

        if let Some(line) = last_nonempty_line(&session.scan_buffer) {
            let trimmed = line.trim_end();
            if trimmed.ends_with([':', '?', '>']) {
                let last_response = session.last_response.clone().unwrap_or_default();
                let label = scanner::clean_prompt_label(trimmed, &last_response);
                let key = scanner::normalize_key(&label);
                let text = trimmed.trim().to_string();
                debug!(session_id = session.id, prompt = %text, "idle fallback synthesized prompt");
                session.note_prompt(key, text);
                return;
            }
        }

        if let Some(previous) = session.last_prompt.clone() {
            debug!(
                session_id = session.id,
                prompt = %previous.text,
                "idle fallback reusing last recognized prompt"
            );
            session.note_prompt(previous.key, previous.text);
        }
        // Otherwise: mid-awaiting silence is normal work (a compile step);
        // keep polling.
    }
}

fn last_nonempty_line(buffer: &str) -> Option<&str> {
    buffer.lines().rev().find(|line| !line.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::config::EngineConfig;
    use crate::session::command::build_invocation;
    use crate::session::events::NullObserver;
    use crate::session::pty::PtyHandle;

    fn quiet_session() -> ShellSession {
        let inv = build_invocation("cat", true);
        let child = PtyHandle::spawn(&inv, None).expect("spawn cat under pty");
        ShellSession::new(1, "cat".to_string(), child, 8000)
    }

    fn backdate(session: &mut ShellSession) {
        let past = Instant::now() - Duration::from_secs(5);
        session.last_output_time = past;
        session.last_send_time = past;
    }

    #[cfg(unix)]
    #[test]
    fn test_idle_fallback_holds_off_until_output_after_send() {
        let config = EngineConfig::default();
        let observer = NullObserver;
        let run_loop = RunLoop::new(&config, &observer);

        let mut session = quiet_session();
        session.append_output("Password: ");
        session.note_prompt("password".into(), "Password:".into());
        session.mark_sent("secret");
        backdate(&mut session);

        // The child took the answer but has printed nothing since; the
        // stale buffer tail must not be re-answered.
        run_loop.idle_fallback(&mut session);
        assert!(session.pending_prompt.is_none());

        // Fresh output after the send re-arms the fallback.
        session.append_output("Password: ");
        backdate(&mut session);
        run_loop.idle_fallback(&mut session);
        assert!(session.pending_prompt.is_some());

        session.child.force_kill();
    }

    #[test]
    fn test_last_nonempty_line() {
        assert_eq!(last_nonempty_line("a\nb\n\n"), Some("b"));
        assert_eq!(last_nonempty_line("\n \n"), None);
        assert_eq!(last_nonempty_line(""), None);
    }
}
