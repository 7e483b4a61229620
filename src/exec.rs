//! Cancellable external command execution.
//!
//! Every external process the engine starts goes through [`run`], which
//! polls the child and kills it when the caller's [`CancelToken`] fires.
//! Commands are synchronous and never retried.

use crate::error::{Error, Result};
use std::process::{Command, Output, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Cloneable cancellation handle shared between the caller and the engine.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. In-flight external commands are killed the
    /// next time their runner polls.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Run `program` with `args`, capturing output.
///
/// Returns [`Error::Cancelled`] if the token fires before the child
/// exits; the child is killed rather than leaked. A non-zero exit is not
/// an error here, callers inspect the returned status.
pub fn run(token: &CancelToken, program: &str, args: &[&str]) -> Result<Output> {
    if token.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    loop {
        if token.is_cancelled() {
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::Cancelled);
        }
        if child.try_wait()?.is_some() {
            break;
        }
        std::thread::sleep(POLL_INTERVAL);
    }

    Ok(child.wait_with_output()?)
}

/// Run a best-effort command: failures (including a missing binary) are
/// logged and swallowed, cancellation still surfaces.
pub fn run_best_effort(token: &CancelToken, program: &str, args: &[&str]) -> Result<()> {
    match run(token, program, args) {
        Ok(out) if out.status.success() => {}
        Ok(out) => {
            log::warn!(
                "{program} {args:?} exited with {}: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            );
        }
        Err(Error::Cancelled) => return Err(Error::Cancelled),
        Err(e) => log::warn!("{program} {args:?} failed to run: {e}"),
    }
    Ok(())
}

/// Whether `program` resolves to an executable on PATH.
pub fn lookup(program: &str) -> bool {
    let Some(paths) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&paths).any(|dir| {
        let candidate = dir.join(program);
        candidate.is_file()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pre_cancelled_token_short_circuits() {
        let token = CancelToken::new();
        token.cancel();
        assert!(matches!(
            run(&token, "true", &[]),
            Err(Error::Cancelled)
        ));
    }

    #[test]
    fn captures_output_and_status() {
        let token = CancelToken::new();
        let out = run(&token, "sh", &["-c", "echo hi; exit 3"]).unwrap();
        assert!(!out.status.success());
        assert_eq!(String::from_utf8_lossy(&out.stdout), "hi\n");
    }

    #[test]
    fn best_effort_swallows_failure() {
        let token = CancelToken::new();
        assert!(run_best_effort(&token, "sh", &["-c", "exit 1"]).is_ok());
        assert!(run_best_effort(&token, "definitely-not-a-binary", &[]).is_ok());
    }

    #[test]
    fn lookup_finds_common_binaries() {
        assert!(lookup("sh"));
        assert!(!lookup("definitely-not-a-binary"));
    }
}
