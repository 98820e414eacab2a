//! Guard for temporarily modifying one environment variable.
//!
//! `std::env::set_var` and `remove_var` are `unsafe` in Rust 2024 because they
//! mutate process-global state. Guards are created through
//! [`EnvLock`](crate::env_lock::EnvLock), which serialises the mutation and
//! drops the guard (restoring the previous value) before releasing the lock.

use std::ffi::OsString;

/// RAII guard that resets an environment variable to its previous value on drop.
#[derive(Debug)]
pub struct EnvVarGuard {
    name: &'static str,
    prev: Option<OsString>,
}

impl EnvVarGuard {
    /// Set `name` to `val`, returning a guard that restores the prior value.
    #[must_use]
    pub(crate) fn set(name: &'static str, val: &str) -> Self {
        let prev = std::env::var_os(name);
        // SAFETY: `EnvLock` serialises mutations of the process environment.
        unsafe { std::env::set_var(name, val) };
        Self { name, prev }
    }

    /// Remove `name`, returning a guard that restores the prior value.
    #[must_use]
    pub(crate) fn remove(name: &'static str) -> Self {
        let prev = std::env::var_os(name);
        // SAFETY: `EnvLock` serialises mutations of the process environment.
        unsafe { std::env::remove_var(name) };
        Self { name, prev }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        // SAFETY: the owning `EnvLock` is still held while guards drop.
        unsafe {
            match self.prev.take() {
                Some(value) => std::env::set_var(self.name, value),
                None => std::env::remove_var(self.name),
            }
        }
    }
}
