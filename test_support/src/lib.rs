//! Test utilities shared by the kumiki integration tests.
//!
//! Scratch declaration trees, a synthetic Windows toolchain listing, and a
//! lock serialising access to the `KUMIKI_*` environment.

pub mod env_lock;
pub mod env_var_guard;
pub mod project;
pub mod toolchain;

pub use env_lock::EnvLock;
pub use project::Project;
