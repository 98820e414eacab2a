//! Serialise environment mutations across tests.
//!
//! Every test that reads or writes `KUMIKI_*` variables holds an [`EnvLock`]
//! for its whole body. Variables set through the lock are restored before the
//! lock is released.

use std::sync::{Mutex, MutexGuard};
use std::{fmt, fmt::Formatter};

use kumiki_env::{
    CROSS_ENV, HOST_ENV, LOG_ENV, ROOT_ENV, SELECT_ENV, STRICT_ENV, WIN_ROOT_ENV,
};

use crate::env_var_guard::EnvVarGuard;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Every variable the generator reads, apart from `HOME`.
pub const KUMIKI_VARS: [&str; 7] = [
    ROOT_ENV,
    CROSS_ENV,
    WIN_ROOT_ENV,
    SELECT_ENV,
    STRICT_ENV,
    HOST_ENV,
    LOG_ENV,
];

/// RAII guard that holds the global environment lock.
pub struct EnvLock {
    restore: Vec<EnvVarGuard>,
    _guard: MutexGuard<'static, ()>,
}

impl fmt::Debug for EnvLock {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvLock")
            .field("overrides", &self.restore.len())
            .finish_non_exhaustive()
    }
}

impl EnvLock {
    /// Acquire the global lock serialising environment mutations.
    pub fn acquire() -> Self {
        let guard = ENV_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Self {
            restore: Vec::new(),
            _guard: guard,
        }
    }

    /// Acquire the lock and unset every `KUMIKI_*` variable until it drops.
    pub fn isolated() -> Self {
        let mut lock = Self::acquire();
        for name in KUMIKI_VARS {
            lock.restore.push(EnvVarGuard::remove(name));
        }
        lock
    }

    /// Set `name` to `value` until the lock drops.
    pub fn set(&mut self, name: &'static str, value: &str) -> &mut Self {
        self.restore.push(EnvVarGuard::set(name, value));
        self
    }
}

impl Drop for EnvLock {
    fn drop(&mut self) {
        // Newest first, while the mutex is still held.
        while let Some(guard) = self.restore.pop() {
            drop(guard);
        }
    }
}
