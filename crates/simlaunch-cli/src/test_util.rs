//! Helpers for tests that touch process-wide environment variables.

use std::ffi::{OsStr, OsString};
use std::sync::{Mutex, MutexGuard};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Serialize tests that read or write environment variables.
pub fn lock_env() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Sets and removes environment variables, restoring the previous values
/// when dropped. Hold [`lock_env`] for as long as this lives.
#[derive(Default)]
pub struct ScopedEnv {
    saved: Vec<(OsString, Option<OsString>)>,
}

impl ScopedEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.save(key.as_ref());
        unsafe { std::env::set_var(key, value) };
        self
    }

    pub fn unset(mut self, key: impl AsRef<OsStr>) -> Self {
        self.save(key.as_ref());
        unsafe { std::env::remove_var(key) };
        self
    }

    fn save(&mut self, key: &OsStr) {
        self.saved.push((key.to_owned(), std::env::var_os(key)));
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (key, value) in self.saved.drain(..).rev() {
            match value {
                Some(value) => unsafe { std::env::set_var(&key, value) },
                None => unsafe { std::env::remove_var(&key) },
            }
        }
    }
}
