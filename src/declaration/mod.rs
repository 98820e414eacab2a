//! Declaration units and the tree loader.
//!
//! A declaration unit contributes edges through a [`Builder`] and names the
//! child units to visit next. Units normally live on disk as YAML `BUILD`
//! files (see [`FsUnitSource`]), but any closure with the right signature is a
//! unit too, which keeps the [`Loader`] testable without a filesystem.

mod diagnostics;
mod error;
mod loader;
mod schema;
mod source;

use std::fmt;

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};

pub use error::LoadError;
pub use loader::Loader;
pub use schema::{Alias, Step, UnitFile};
pub use source::{FsUnitSource, MemoryUnitSource, UnitSource};

use crate::graph::{Builder, GraphError, normalize};

/// File name of a unit inside its location.
pub const UNIT_FILE: &str = "BUILD";

/// Location of a unit relative to the tree root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitPath(Utf8PathBuf);

impl UnitPath {
    /// Normalise `location`; `.` and the empty string name the root.
    #[must_use]
    pub fn new(location: impl AsRef<str>) -> Self {
        let trimmed = location.as_ref().trim();
        let raw = if trimmed.is_empty() { "." } else { trimmed };
        Self(normalize(Utf8Path::new(raw)))
    }

    /// The root unit.
    #[must_use]
    pub fn root() -> Self {
        Self(Utf8PathBuf::from("."))
    }

    /// Whether this is the root unit.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0 == "."
    }

    /// Whether the location escapes the tree root.
    #[must_use]
    pub fn escapes_root(&self) -> bool {
        self.0.is_absolute()
            || self
                .0
                .components()
                .next()
                .is_some_and(|c| c == Utf8Component::ParentDir)
    }

    /// Path of the unit file relative to the tree root.
    #[must_use]
    pub fn file(&self) -> Utf8PathBuf {
        if self.is_root() {
            Utf8PathBuf::from(UNIT_FILE)
        } else {
            self.0.join(UNIT_FILE)
        }
    }

    /// Build-file path recorded for regeneration, e.g. `$src/posix/BUILD`.
    #[must_use]
    pub fn identity(&self) -> String {
        format!("$src/{}", self.file())
    }

    /// Location as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for UnitPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl From<&str> for UnitPath {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Something that declares edges and names child units.
pub trait DeclarationUnit {
    /// Append this unit's contribution and return the children to visit.
    ///
    /// # Errors
    ///
    /// Returns the [`GraphError`] raised by the first rejected builder call.
    fn declare(&self, builder: &mut Builder<'_>) -> Result<Vec<UnitPath>, GraphError>;
}

impl<F> DeclarationUnit for F
where
    F: Fn(&mut Builder<'_>) -> Result<Vec<UnitPath>, GraphError>,
{
    fn declare(&self, builder: &mut Builder<'_>) -> Result<Vec<UnitPath>, GraphError> {
        self(builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(".", "$src/BUILD")]
    #[case("", "$src/BUILD")]
    #[case("posix/", "$src/posix/BUILD")]
    #[case("./esp32/../web", "$src/web/BUILD")]
    fn identities(#[case] location: &str, #[case] expected: &str) {
        assert_eq!(UnitPath::new(location).identity(), expected);
    }

    #[rstest]
    #[case("../sibling", true)]
    #[case("a/../../b", true)]
    #[case("/etc", true)]
    #[case("a/../b", false)]
    fn escaping_locations(#[case] location: &str, #[case] escapes: bool) {
        assert_eq!(UnitPath::new(location).escapes_root(), escapes);
    }
}
