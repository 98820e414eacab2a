//! Filesystem probing for installed binaries.
//!
//! Probes never touch the filesystem directly: they ask a [`PathLister`] for
//! the entries matching a glob pattern and apply a [`Selection`] policy when
//! more than one installation is present.

use std::cmp::Ordering;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use glob::{MatchOptions, Pattern};
use itertools::{EitherOrBoth, Itertools};
use tracing::debug;

use super::ToolchainError;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Lists filesystem entries matching a glob pattern.
pub trait PathLister {
    /// Entries matching `pattern`, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns [`ToolchainError::Pattern`] for an invalid pattern and
    /// [`ToolchainError::Listing`] when a directory cannot be read.
    fn list(&self, pattern: &str) -> Result<Vec<Utf8PathBuf>, ToolchainError>;
}

/// Lists entries on the real filesystem with the `glob` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobLister;

impl PathLister for GlobLister {
    fn list(&self, pattern: &str) -> Result<Vec<Utf8PathBuf>, ToolchainError> {
        let entries =
            glob::glob_with(pattern, MATCH_OPTIONS).map_err(|source| ToolchainError::Pattern {
                pattern: pattern.to_owned(),
                source,
            })?;
        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|source| ToolchainError::Listing {
                pattern: pattern.to_owned(),
                source,
            })?;
            match Utf8PathBuf::try_from(path) {
                Ok(utf8) => paths.push(utf8),
                Err(err) => debug!(path = ?err.as_path(), "skipping non UTF-8 match"),
            }
        }
        Ok(paths)
    }
}

/// Matches patterns against a fixed set of paths.
///
/// Lets tests describe an installation without creating it on disk.
#[derive(Debug, Clone, Default)]
pub struct StaticLister {
    entries: Vec<Utf8PathBuf>,
}

impl StaticLister {
    /// Lister reporting exactly `entries`.
    pub fn new<I, P>(entries: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Utf8PathBuf>,
    {
        Self {
            entries: entries.into_iter().map(Into::into).collect(),
        }
    }
}

impl PathLister for StaticLister {
    fn list(&self, pattern: &str) -> Result<Vec<Utf8PathBuf>, ToolchainError> {
        let compiled = Pattern::new(pattern).map_err(|source| ToolchainError::Pattern {
            pattern: pattern.to_owned(),
            source,
        })?;
        Ok(self
            .entries
            .iter()
            .filter(|entry| compiled.matches_with(entry.as_str(), MATCH_OPTIONS))
            .cloned()
            .collect())
    }
}

/// How to choose between several matching installations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Selection {
    /// First entry of the lexically sorted listing.
    #[default]
    First,
    /// Greatest entry when digit runs compare as numbers.
    Latest,
}

impl Selection {
    /// Pick one of `candidates`.
    #[must_use]
    pub fn pick(self, mut candidates: Vec<Utf8PathBuf>) -> Option<Utf8PathBuf> {
        match self {
            Self::First => {
                candidates.sort();
                candidates.into_iter().next()
            }
            Self::Latest => candidates
                .into_iter()
                .max_by(|a, b| natural_cmp(a.as_str(), b.as_str())),
        }
    }

    /// Identifier accepted in configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Latest => "latest",
        }
    }
}

impl FromStr for Selection {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "first" => Ok(Self::First),
            "latest" => Ok(Self::Latest),
            other => Err(format!("unknown selection policy `{other}`; expected `first` or `latest`")),
        }
    }
}

/// Compare strings so that `14.29` sorts after `14.9`.
///
/// Runs of ASCII digits compare by numeric value, everything else compares
/// bytewise.
///
/// ```
/// use std::cmp::Ordering;
/// use kumiki::toolchain::natural_cmp;
///
/// assert_eq!(natural_cmp("MSVC/14.29", "MSVC/14.9"), Ordering::Greater);
/// assert_eq!(natural_cmp("v007", "v7"), Ordering::Equal);
/// ```
#[must_use]
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    chunks(a)
        .zip_longest(chunks(b))
        .map(|pair| match pair {
            EitherOrBoth::Both(x, y) => compare_chunks(x, y),
            EitherOrBoth::Left(_) => Ordering::Greater,
            EitherOrBoth::Right(_) => Ordering::Less,
        })
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}

fn compare_chunks(x: &str, y: &str) -> Ordering {
    let numeric = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if numeric(x) && numeric(y) {
        let xs = x.trim_start_matches('0');
        let ys = y.trim_start_matches('0');
        xs.len().cmp(&ys.len()).then_with(|| xs.cmp(ys))
    } else {
        x.cmp(y)
    }
}

/// Split `s` into alternating digit and non-digit runs.
fn chunks(s: &str) -> impl Iterator<Item = &str> {
    let mut rest = s;
    std::iter::from_fn(move || {
        let digits = rest.chars().next()?.is_ascii_digit();
        let end = rest
            .find(|c: char| c.is_ascii_digit() != digits)
            .unwrap_or(rest.len());
        let (head, tail) = rest.split_at(end);
        rest = tail;
        Some(head)
    })
}

/// Escape `path` so it can prefix a glob pattern literally.
pub(super) fn literal(path: &Utf8Path) -> String {
    Pattern::escape(path.as_str())
}

/// Run one probe and apply `selection`; `None` when nothing matched.
///
/// # Errors
///
/// Propagates [`PathLister::list`] failures.
pub(super) fn find(
    lister: &dyn PathLister,
    tool: &str,
    pattern: &str,
    selection: Selection,
) -> Result<Option<Utf8PathBuf>, ToolchainError> {
    let candidates = lister.list(pattern)?;
    debug!(tool, pattern, matches = candidates.len(), "probe");
    let chosen = selection.pick(candidates);
    if let Some(path) = &chosen {
        debug!(tool, path = %path, policy = selection.as_str(), "selected");
    }
    Ok(chosen)
}

/// Like [`find`] but a missing match is an error.
///
/// # Errors
///
/// Returns [`ToolchainError::NotFound`] when nothing matches.
pub(super) fn require(
    lister: &dyn PathLister,
    tool: &str,
    pattern: &str,
    selection: Selection,
) -> Result<Utf8PathBuf, ToolchainError> {
    find(lister, tool, pattern, selection)?.ok_or_else(|| ToolchainError::NotFound {
        tool: tool.to_owned(),
        pattern: pattern.to_owned(),
    })
}
