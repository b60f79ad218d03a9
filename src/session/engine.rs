//! Engine entry point: one operation, two calling shapes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use super::command::build_invocation;
use super::events::{SessionEvent, SessionObserver, StdoutObserver};
use super::pty::PtyHandle;
use super::registry::SessionRegistry;
use super::error::SessionError;
use super::resolver::ResponseSource;
use super::result::{RunResult, RunStatus};
use super::run_loop::{LoopOutcome, RunLoop};
use super::state::ShellSession;
use crate::config::EngineConfig;

/// Parameters for one engine call.
///
/// A new session needs `command`; a continuation needs `session_id` (and
/// `command` is ignored). `input_line` is sent immediately as a manual
/// answer before polling resumes; `responses` replaces the session's
/// response source.
#[derive(Debug, Default)]
pub struct RunRequest {
    pub command: Option<String>,
    /// Seconds until the child is force-terminated. `None` uses the engine
    /// default; zero or negative means no deadline.
    pub timeout_secs: Option<i64>,
    pub responses: Option<ResponseSource>,
    pub session_id: Option<u64>,
    pub input_line: Option<String>,
}

impl RunRequest {
    pub fn command(command: impl Into<String>) -> Self {
        Self {
            command: Some(command.into()),
            ..Default::default()
        }
    }

    pub fn continuation(session_id: u64) -> Self {
        Self {
            session_id: Some(session_id),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: i64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn with_responses(mut self, responses: ResponseSource) -> Self {
        self.responses = Some(responses);
        self
    }

    pub fn with_input(mut self, line: impl Into<String>) -> Self {
        self.input_line = Some(line.into());
        self
    }
}

/// Owns the session registry, the observer, and the tuning knobs.
///
/// Each call is synchronous and blocking: it returns a terminal result or a
/// `need_input` pause. Multiple independent sessions may run concurrently,
/// but a single session must only be driven by one call at a time.
pub struct ShellEngine {
    config: EngineConfig,
    registry: SessionRegistry,
    observer: Arc<dyn SessionObserver>,
}

impl ShellEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_observer(config, Arc::new(StdoutObserver))
    }

    pub fn with_observer(config: EngineConfig, observer: Arc<dyn SessionObserver>) -> Self {
        Self {
            config,
            registry: SessionRegistry::new(),
            observer,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Run a command in a new interactive session, or resume a paused one.
    /// Failures are reported through the result, never panics or retries.
    pub fn run(&self, request: RunRequest) -> RunResult {
        let timeout_secs = request
            .timeout_secs
            .unwrap_or(self.config.default_timeout_secs);
        let deadline = (timeout_secs > 0)
            .then(|| Instant::now() + Duration::from_secs(timeout_secs as u64));

        let (mut session, mut warning) = match request.session_id {
            Some(id) => match self.resume(id, request.responses, request.input_line) {
                Ok(session) => (session, String::new()),
                Err(result) => return result,
            },
            None => match self.start(request.command, request.responses) {
                Ok(pair) => pair,
                Err(result) => return result,
            },
        };

        let run_loop = RunLoop::new(&self.config, self.observer.as_ref());
        let outcome = run_loop.drive(&mut session, deadline);

        let result = match outcome {
            LoopOutcome::Completed { returncode } => {
                RunResult::completed(session.full_output.clone(), warning.clone(), returncode)
            }
            LoopOutcome::TimedOut => {
                if !warning.is_empty() {
                    warning.push_str("; ");
                }
                warning.push_str(&SessionError::Timeout(timeout_secs).to_string());
                RunResult::error(session.full_output.clone(), warning.clone())
            }
            LoopOutcome::Failed { message } => {
                RunResult::error(session.full_output.clone(), message)
            }
            LoopOutcome::NeedInput { prompt } => {
                let result = RunResult::need_input(
                    session.full_output.clone(),
                    warning.clone(),
                    prompt,
                    session.id,
                );
                self.observer.emit(
                    session.id,
                    &SessionEvent::End {
                        status: RunStatus::NeedInput,
                        returncode: -1,
                    },
                );
                // The paused session stays alive for a follow-up call.
                self.registry.insert(session);
                return result;
            }
        };

        self.observer.emit(
            session.id,
            &SessionEvent::End {
                status: result.status,
                returncode: result.returncode,
            },
        );
        result
    }

    /// Destroy a paused session without resuming it.
    pub fn destroy_session(&self, id: u64) -> bool {
        match self.registry.take(id) {
            Some(mut session) => {
                session.child.force_kill();
                info!(session_id = id, "paused session destroyed");
                true
            }
            None => false,
        }
    }

    fn start(
        &self,
        command: Option<String>,
        responses: Option<ResponseSource>,
    ) -> Result<(ShellSession, String), RunResult> {
        let Some(command) = command else {
            return Err(RunResult::error(String::new(), "command required"));
        };

        let invocation = build_invocation(&command, true);
        let mut warning = String::new();
        if let Some(text) = invocation.rewrite_warning() {
            warn!(command = %command, "{text}");
            warning = text;
        }

        let child = match PtyHandle::spawn(&invocation, None) {
            Ok(child) => child,
            Err(e) => return Err(RunResult::error(String::new(), e.to_string())),
        };

        let id = self.registry.next_id();
        let mut session = ShellSession::new(id, command.clone(), child, self.config.scan_buffer_cap);
        if let Some(responses) = responses {
            session.set_responses(responses);
        }

        self.observer
            .emit(id, &SessionEvent::Start { command });
        if !warning.is_empty() {
            self.observer.emit(
                id,
                &SessionEvent::Info {
                    message: warning.clone(),
                },
            );
        }
        Ok((session, warning))
    }

    fn resume(
        &self,
        id: u64,
        responses: Option<ResponseSource>,
        input_line: Option<String>,
    ) -> Result<ShellSession, RunResult> {
        let Some(mut session) = self.registry.take(id) else {
            return Err(RunResult::error(
                String::new(),
                SessionError::UnknownSession(id).to_string(),
            ));
        };

        if let Some(responses) = responses {
            session.set_responses(responses);
        }

        if let Some(line) = input_line {
            self.observer
                .emit(id, &SessionEvent::Send { input: line.clone() });
            if let Err(e) = session.child.send_line(&line) {
                session.child.force_kill();
                return Err(RunResult::error(
                    session.full_output.clone(),
                    SessionError::ReadFailure(e.to_string()).to_string(),
                ));
            }
            session.mark_sent(&line);
        }

        Ok(session)
    }
}
