//! Host platform identification.

use std::fmt;

/// Platform the generated build file targets natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Host {
    /// GNU/Linux.
    Linux,
    /// macOS.
    Darwin,
    /// Anything else; only the common flag sets apply.
    Other,
}

impl Host {
    /// Platform the generator was compiled for.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(target_os = "linux") {
            Self::Linux
        } else if cfg!(target_os = "macos") {
            Self::Darwin
        } else {
            Self::Other
        }
    }

    /// Identifier used in configuration and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Darwin => "darwin",
            Self::Other => "other",
        }
    }
}

impl From<&str> for Host {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "linux" => Self::Linux,
            "darwin" | "macos" => Self::Darwin,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
