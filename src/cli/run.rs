//! `shellmate run` - interactive execution with prompt auto-answering.

use std::collections::HashMap;
use std::io::{BufRead, Write};

use anyhow::{bail, Result};

use shellmate::{EngineConfig, ResponseSource, RunRequest, RunStatus, ShellEngine};

pub fn run_command(
    config: EngineConfig,
    command: String,
    timeout: Option<i64>,
    responses: Vec<String>,
    respond_map: Vec<String>,
    json: bool,
) -> Result<()> {
    let engine = ShellEngine::new(config);

    let source = build_source(responses, respond_map)?;
    let mut request = RunRequest::command(command);
    if let Some(secs) = timeout {
        request = request.with_timeout(secs);
    }
    if let Some(source) = source {
        request = request.with_responses(source);
    }

    let mut result = engine.run(request);

    // Without --json, unanswered prompts fall through to the human at the
    // terminal and the session resumes in-process.
    while !json && result.status == RunStatus::NeedInput {
        let prompt = result.prompt.as_deref().unwrap_or("(input)");
        let Some(session_id) = result.session_id else {
            bail!("need_input result did not carry a session id");
        };

        print!("{prompt} ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        let line = line.trim_end_matches(['\r', '\n']).to_string();

        let mut request = RunRequest::continuation(session_id).with_input(line);
        if let Some(secs) = timeout {
            request = request.with_timeout(secs);
        }
        result = engine.run(request);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        if !result.stderr.is_empty() {
            eprintln!("{}", result.stderr);
        }
        if result.status == RunStatus::Completed && result.returncode != 0 {
            eprintln!("exit code: {}", result.returncode);
        }
    }

    Ok(())
}

/// Convert the CLI flags into a response source. Queue and map are mutually
/// exclusive (clap already enforces it; `bail` guards programmatic misuse).
fn build_source(
    responses: Vec<String>,
    respond_map: Vec<String>,
) -> Result<Option<ResponseSource>> {
    if !responses.is_empty() && !respond_map.is_empty() {
        bail!("--respond and --respond-map are mutually exclusive");
    }

    if !responses.is_empty() {
        return Ok(Some(ResponseSource::queue(responses)));
    }

    if !respond_map.is_empty() {
        let mut map = HashMap::new();
        for entry in respond_map {
            let Some((key, value)) = entry.split_once('=') else {
                bail!("invalid --respond-map entry (expected KEY=VALUE): {entry}");
            };
            map.insert(key.to_string(), value.to_string());
        }
        return Ok(Some(ResponseSource::keyed(map)));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_source_queue() {
        let source = build_source(vec!["a".into()], vec![]).unwrap();
        assert!(matches!(source, Some(ResponseSource::Queue { .. })));
    }

    #[test]
    fn test_build_source_map() {
        let source = build_source(vec![], vec!["name=Alice".into()]).unwrap();
        assert!(matches!(source, Some(ResponseSource::Keyed(_))));
    }

    #[test]
    fn test_build_source_rejects_bad_entry() {
        assert!(build_source(vec![], vec!["no-equals".into()]).is_err());
    }
}
