#![forbid(unsafe_code)]

//! Environment variable names shared across kumiki crates (library, binary,
//! and test helpers).
//!
//! The generator reads its whole configuration from these variables; the
//! command line only carries `-q/--quiet`.

/// Root directory of the declaration tree.
///
/// # Examples
///
/// ```
/// use kumiki_env::ROOT_ENV;
/// assert_eq!(ROOT_ENV, "KUMIKI_ROOT");
/// ```
pub const ROOT_ENV: &str = "KUMIKI_ROOT";

/// Switch for the secondary (Windows) toolchain probes.
pub const CROSS_ENV: &str = "KUMIKI_CROSS";

/// Translated filesystem root holding the Windows program files.
pub const WIN_ROOT_ENV: &str = "KUMIKI_WIN_ROOT";

/// Toolchain selection policy (`first` or `latest`).
pub const SELECT_ENV: &str = "KUMIKI_TOOLCHAIN_SELECT";

/// Reject unresolved template variables instead of passing them through.
pub const STRICT_ENV: &str = "KUMIKI_STRICT_VARS";

/// Override for the host platform identifier.
pub const HOST_ENV: &str = "KUMIKI_HOST";

/// `tracing` filter directive for log output.
pub const LOG_ENV: &str = "KUMIKI_LOG";

/// Home directory, consulted for the optional `d8` probe.
pub const HOME_ENV: &str = "HOME";
