//! `shellmate exec` - plain non-interactive execution.

use anyhow::Result;

use shellmate::exec::run_plain;
use shellmate::{EngineConfig, RunStatus};

pub fn exec_command(
    config: EngineConfig,
    command: String,
    timeout: Option<i64>,
    json: bool,
) -> Result<()> {
    let timeout_secs = timeout.unwrap_or(config.default_timeout_secs);
    let result = run_plain(&command, timeout_secs);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    print!("{}", result.stdout);
    if !result.stderr.is_empty() {
        eprintln!("{}", result.stderr);
    }
    if result.status == RunStatus::Completed && result.returncode != 0 {
        eprintln!("exit code: {}", result.returncode);
    }

    Ok(())
}
