//! Shell invocation building.
//!
//! Interactive sessions run over a line-buffered pseudo-terminal channel
//! that cannot reliably track exit-status-gated chaining, so `&&`, `||` and
//! a standalone `&` are rewritten to `;` - sequential execution is the only
//! safe approximation. This narrows the semantics of short-circuit chains;
//! the rewrite is reported back to the caller rather than hidden.

use once_cell::sync::Lazy;
use regex::Regex;

/// `&&` and `||` anywhere, but a single `&` only when whitespace-delimited,
/// so quoted ampersands and URL query strings pass through untouched.
static SEPARATOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s*(?:&&|\|\|)\s*|\s&\s").expect("separator pattern is valid")
});

/// A ready-to-spawn shell invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellInvocation {
    pub program: String,
    pub args: Vec<String>,
    /// True when command separators were rewritten to `;`.
    pub rewritten: bool,
}

impl ShellInvocation {
    /// Caller-facing warning text when the rewrite changed chain semantics.
    pub fn rewrite_warning(&self) -> Option<String> {
        self.rewritten.then(|| {
            "command separators (&&, ||, &) were rewritten to ';' for the \
             interactive channel; short-circuit chaining does not apply"
                .to_string()
        })
    }
}

/// Build the platform shell invocation for a raw command string.
///
/// Non-interactive invocations suppress shell profiles (and, on Windows,
/// relax the execution policy) so output stays predictable; interactive mode
/// must not suppress prompts and adds none of those flags.
pub fn build_invocation(raw: &str, interactive: bool) -> ShellInvocation {
    let (command, rewritten) = rewrite_separators(raw);

    #[cfg(windows)]
    {
        let mut args = vec!["-NoLogo".to_string()];
        if !interactive {
            args.push("-NoProfile".to_string());
            args.push("-ExecutionPolicy".to_string());
            args.push("Bypass".to_string());
        }
        args.push("-Command".to_string());
        args.push(escape_double_quotes(&command));
        ShellInvocation {
            program: "powershell".to_string(),
            args,
            rewritten,
        }
    }

    #[cfg(not(windows))]
    {
        let mut args = Vec::new();
        if !interactive {
            args.push("--noprofile".to_string());
            args.push("--norc".to_string());
        }
        args.push("-c".to_string());
        args.push(command);
        ShellInvocation {
            program: "bash".to_string(),
            args,
            rewritten,
        }
    }
}

/// Rewrite command-separator tokens to `;`, returning whether anything
/// changed.
fn rewrite_separators(raw: &str) -> (String, bool) {
    let trimmed = raw.trim();
    let command = SEPARATOR_RE.replace_all(trimmed, "; ").into_owned();
    let rewritten = command != trimmed;
    (command, rewritten)
}

#[cfg(windows)]
fn escape_double_quotes(command: &str) -> String {
    command.replace('"', "\\\"")
}
