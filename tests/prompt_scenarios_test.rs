//! E2E tests for the prompt-detection heuristics against real commands.
//!
//! Each test runs a small shell script under a PTY and checks that the
//! engine answers, skips, or synthesizes prompts the way a human operator
//! would expect.

#![cfg(unix)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use shellmate::session::NullObserver;
use shellmate::{EngineConfig, ResponseSource, RunRequest, RunStatus, ShellEngine};

fn engine() -> ShellEngine {
    ShellEngine::with_observer(EngineConfig::default(), Arc::new(NullObserver))
}

#[test]
fn keyed_response_matches_prompt_by_substring() {
    let engine = engine();
    let mut map = HashMap::new();
    map.insert("name".to_string(), "Alice".to_string());

    let result = engine.run(
        RunRequest::command(r#"printf 'Enter your name: '; read n; echo "Hi $n""#)
            .with_timeout(20)
            .with_responses(ResponseSource::keyed(map)),
    );
    assert_eq!(result.status, RunStatus::Completed);
    assert!(result.stdout.contains("Hi Alice"), "stdout: {:?}", result.stdout);
}

#[test]
fn informational_colon_line_does_not_suspend() {
    // "About to ..." lines look like prompts but never wait for input. The
    // label filter must let the command run to completion.
    let engine = engine();
    let start = Instant::now();
    let result = engine.run(
        RunRequest::command(r#"echo "About to write to disk:"; sleep 0.5; echo done"#)
            .with_timeout(20),
    );
    assert_eq!(result.status, RunStatus::Completed, "stderr: {:?}", result.stderr);
    assert_eq!(result.returncode, 0);
    assert!(result.stdout.contains("done"));
    assert!(start.elapsed().as_secs() < 15, "must not sit out the deadline");
}

#[test]
fn repeated_prompt_resends_last_response() {
    // Three identical prompts printed up front, then three reads. The first
    // answer comes from the queue; the silent reads afterwards are detected
    // through the idle fallback, which reuses the last prompt and resends.
    let engine = engine();
    let script = concat!(
        r#"printf 'Continue? (y/n): Continue? (y/n): Continue? (y/n): '; "#,
        r#"read a; read b; read c; echo "got $a $b $c""#
    );
    let result = engine.run(
        RunRequest::command(script)
            .with_timeout(30)
            .with_responses(ResponseSource::queue(vec!["y".to_string()])),
    );
    assert_eq!(result.status, RunStatus::Completed, "stderr: {:?}", result.stderr);
    assert!(result.stdout.contains("got y y y"), "stdout: {:?}", result.stdout);
}

#[test]
fn idle_fallback_synthesizes_bare_angle_prompt() {
    // "> " carries no label the grammar accepts; only the idle fallback can
    // turn the quiet tail line into a prompt.
    let engine = engine();
    let script = r#"printf 'Your name: '; read n; printf '> '; read cmd; echo "cmd=$cmd""#;
    let result = engine.run(
        RunRequest::command(script)
            .with_timeout(30)
            .with_responses(ResponseSource::queue(vec![
                "Alice".to_string(),
                "quit".to_string(),
            ])),
    );
    assert_eq!(result.status, RunStatus::Completed, "stderr: {:?}", result.stderr);
    assert!(result.stdout.contains("cmd=quit"), "stdout: {:?}", result.stdout);
}

#[test]
fn wildcard_key_answers_unmatched_prompt() {
    let engine = engine();
    let mut map = HashMap::new();
    map.insert("*".to_string(), "fallback".to_string());

    let result = engine.run(
        RunRequest::command(r#"printf 'Pick anything: '; read x; echo "picked $x""#)
            .with_timeout(20)
            .with_responses(ResponseSource::keyed(map)),
    );
    assert_eq!(result.status, RunStatus::Completed);
    assert!(result.stdout.contains("picked fallback"), "stdout: {:?}", result.stdout);
}

#[test]
fn shell_separator_rewrite_is_surfaced_as_warning() {
    let engine = engine();
    let result = engine.run(RunRequest::command("echo one && echo two").with_timeout(20));
    assert_eq!(result.status, RunStatus::Completed);
    assert!(result.stdout.contains("one"));
    assert!(result.stdout.contains("two"));
    assert!(
        result.stderr.contains("rewritten"),
        "rewrite must be reported: {:?}",
        result.stderr
    );
}

#[test]
fn exhausted_queue_suspends_on_next_prompt() {
    let engine = engine();
    let script = concat!(
        r#"printf 'First: '; read a; "#,
        r#"printf 'Second: '; read b; echo "$a/$b""#
    );
    let result = engine.run(
        RunRequest::command(script)
            .with_timeout(30)
            .with_responses(ResponseSource::queue(vec!["one".to_string()])),
    );
    assert_eq!(result.status, RunStatus::NeedInput, "stderr: {:?}", result.stderr);
    assert_eq!(result.prompt.as_deref(), Some("Second:"));

    let session_id = result.session_id.expect("paused session id");
    let resumed = engine.run(
        RunRequest::continuation(session_id)
            .with_timeout(20)
            .with_input("two"),
    );
    assert_eq!(resumed.status, RunStatus::Completed);
    assert!(resumed.stdout.contains("one/two"), "stdout: {:?}", resumed.stdout);
}
