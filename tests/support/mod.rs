//! Shared helpers for integration tests.

use std::sync::Mutex;

// Environment variables are process-global and the test harness runs tests
// in parallel, so every test that touches them must hold this lock.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Runs `f` with the given environment overrides in place, restoring the
/// previous values afterwards (also on panic). `None` unsets the variable.
pub fn with_scoped_env<R>(overrides: &[(&str, Option<&str>)], f: impl FnOnce() -> R) -> R {
    let _serialized = ENV_MUTEX
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let _restore = EnvOverride::apply(overrides);
    f()
}

struct EnvOverride {
    saved: Vec<(String, Option<String>)>,
}

impl EnvOverride {
    fn apply(overrides: &[(&str, Option<&str>)]) -> Self {
        let mut saved: Vec<(String, Option<String>)> = Vec::with_capacity(overrides.len());
        for (key, value) in overrides {
            // Save the first-seen value only, so a key listed twice still
            // restores to its pre-test state.
            if !saved.iter().any(|(k, _)| k == key) {
                saved.push((key.to_string(), std::env::var(key).ok()));
            }
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
        Self { saved }
    }
}

impl Drop for EnvOverride {
    fn drop(&mut self) {
        for (key, value) in self.saved.drain(..) {
            match value {
                Some(v) => std::env::set_var(&key, v),
                None => std::env::remove_var(&key),
            }
        }
    }
}
