//! Per-session mutable state.

use std::time::Instant;

use super::pty::PtyHandle;
use super::resolver::ResponseSource;

/// A detected prompt awaiting an auto-response or a human answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPrompt {
    /// Normalized lookup key (cleaned label, whitespace-collapsed,
    /// lower-cased).
    pub key: String,
    /// Full prompt text as shown to the caller.
    pub text: String,
}

/// One spawned interactive command plus everything needed to resume
/// interaction with it across multiple calls.
///
/// Created by the engine on the first call, mutated by the run loop, and
/// destroyed (child released, registry entry removed) on completion, timeout
/// or an unrecoverable read error. A paused session survives in the registry
/// until a later call supplies input.
pub struct ShellSession {
    /// Process-wide unique id, assigned monotonically; never reused.
    pub id: u64,
    /// The command that started this session. Immutable after creation.
    pub command: String,
    /// Exclusive PTY handle; released exactly once.
    pub child: PtyHandle,
    /// Everything the process ever printed, returned verbatim to the caller.
    pub full_output: String,
    /// Bounded rolling window of recent output used for prompt matching.
    pub scan_buffer: String,
    /// Offset into `scan_buffer` already scanned; matches ending at or
    /// before it are ignored on the next pass.
    pub scan_pos: usize,
    /// Offset into `scan_buffer` at the time of the last input send; the
    /// idle-fallback re-scan only considers content printed after it.
    pub send_scan_pos: usize,
    pub pending_prompt: Option<PendingPrompt>,
    pub response_source: Option<ResponseSource>,
    /// Most recently sent input; the empty string means "just pressed
    /// enter". Used for repeat detection and echo stripping.
    pub last_response: Option<String>,
    /// Consecutive reappearances of the same prompt.
    pub repeat_count: u32,
    /// Last prompt ever detected, kept across sends for repeat detection
    /// and the idle-fallback synthesis.
    pub last_prompt: Option<PendingPrompt>,
    pub last_output_time: Instant,
    pub last_send_time: Instant,
    /// True between sending input and the next output arriving; prevents
    /// re-answering the just-answered prompt from stale buffer content.
    pub awaiting_prompt: bool,
    /// True once any legitimate prompt was ever detected; gates the
    /// idle-timeout fallback so it never fires on a silent build.
    pub saw_prompt: bool,
    scan_cap: usize,
}

impl ShellSession {
    pub fn new(id: u64, command: String, child: PtyHandle, scan_cap: usize) -> Self {
        let now = Instant::now();
        Self {
            id,
            command,
            child,
            full_output: String::new(),
            scan_buffer: String::new(),
            scan_pos: 0,
            send_scan_pos: 0,
            pending_prompt: None,
            response_source: None,
            last_response: None,
            repeat_count: 0,
            last_prompt: None,
            last_output_time: now,
            last_send_time: now,
            awaiting_prompt: false,
            saw_prompt: false,
            scan_cap,
        }
    }

    /// Append a chunk of child output. The scan buffer is front-trimmed to
    /// its cap, with both scan offsets adjusted so they remain valid offsets
    /// into the current buffer. New output clears `awaiting_prompt` - the
    /// child made progress after the last send.
    pub fn append_output(&mut self, chunk: &str) {
        self.full_output.push_str(chunk);
        self.scan_buffer.push_str(chunk);

        if self.scan_buffer.len() > self.scan_cap {
            let mut cut = self.scan_buffer.len() - self.scan_cap;
            while !self.scan_buffer.is_char_boundary(cut) {
                cut += 1;
            }
            self.scan_buffer.drain(..cut);
            self.scan_pos = self.scan_pos.saturating_sub(cut);
            self.send_scan_pos = self.send_scan_pos.saturating_sub(cut);
        }

        self.last_output_time = Instant::now();
        self.awaiting_prompt = false;
    }

    /// Record a detected (or synthesized) prompt as pending. A prompt
    /// identical to the previous one counts as a repeat; a genuinely
    /// different prompt resets the repeat counter.
    pub fn note_prompt(&mut self, key: String, text: String) {
        let prompt = PendingPrompt { key, text };
        if self.last_prompt.as_ref() == Some(&prompt) {
            self.repeat_count += 1;
        } else {
            self.repeat_count = 0;
        }
        self.last_prompt = Some(prompt.clone());
        self.pending_prompt = Some(prompt);
        self.saw_prompt = true;
    }

    /// Bookkeeping after an input line was written to the child: clears the
    /// pending prompt, arms `awaiting_prompt`, and remembers the response
    /// for echo stripping and repeat resending.
    pub fn mark_sent(&mut self, value: &str) {
        self.last_response = Some(value.to_string());
        self.last_send_time = Instant::now();
        self.awaiting_prompt = true;
        self.pending_prompt = None;
        self.send_scan_pos = self.scan_buffer.len();
    }

    /// Replace the response source (queue XOR map - the enum enforces the
    /// exclusivity) and reset repeat tracking.
    pub fn set_responses(&mut self, source: ResponseSource) {
        self.response_source = Some(source);
        self.repeat_count = 0;
    }
}
