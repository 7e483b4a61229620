//! Best-effort service reloads.

use crate::exec::{self, CancelToken};

/// Ask common service managers to reload each named unit. Advisory: a
/// failed reload must not block an otherwise successful change, so every
/// failure (and cancellation mid-reload) is swallowed after logging.
pub fn reload(token: &CancelToken, names: &[&str]) {
    for name in names.iter().copied() {
        if exec::run_best_effort(token, "systemctl", &["reload", name]).is_err() {
            return;
        }
        if exec::run_best_effort(token, "service", &[name, "reload"]).is_err() {
            return;
        }
    }
}
