//! Where declaration units come from.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use indexmap::IndexMap;

use super::{DeclarationUnit, LoadError, UnitFile, UnitPath};
use crate::graph::{Builder, GraphError};

/// Resolves unit locations and runs the unit found there.
pub trait UnitSource {
    /// Run the unit at `unit` against `builder`, returning its children.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Unreadable`] when no unit exists at the location,
    /// [`LoadError::Parse`] for an invalid unit, and [`LoadError::Declare`]
    /// when the builder rejects one of its requests.
    fn declare(&self, unit: &UnitPath, builder: &mut Builder<'_>)
    -> Result<Vec<UnitPath>, LoadError>;
}

fn declared(
    unit: &UnitPath,
    result: Result<Vec<UnitPath>, GraphError>,
) -> Result<Vec<UnitPath>, LoadError> {
    result.map_err(|source| LoadError::Declare {
        unit: unit.identity(),
        source,
    })
}

/// Reads YAML `BUILD` files below a root directory.
///
/// All reads go through a capability handle on the root, so an include can
/// never reach a file outside the tree.
#[derive(Debug)]
pub struct FsUnitSource {
    root: Utf8PathBuf,
    dir: Dir,
}

impl FsUnitSource {
    /// Open the tree rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Unreadable`] if `root` is not a readable directory.
    pub fn open(root: &Utf8Path) -> Result<Self, LoadError> {
        let dir = Dir::open_ambient_dir(root, ambient_authority())
            .map_err(|source| LoadError::unreadable_root(root, source))?;
        Ok(Self {
            root: root.to_path_buf(),
            dir,
        })
    }

    /// Directory the tree was opened from.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Read and parse the unit at `unit` without running it.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Unreadable`] or [`LoadError::Parse`].
    pub fn read(&self, unit: &UnitPath) -> Result<UnitFile, LoadError> {
        let text = self
            .dir
            .read_to_string(unit.file())
            .map_err(|source| LoadError::unreadable(unit, source))?;
        UnitFile::parse(&text, &unit.identity())
    }
}

impl UnitSource for FsUnitSource {
    fn declare(
        &self,
        unit: &UnitPath,
        builder: &mut Builder<'_>,
    ) -> Result<Vec<UnitPath>, LoadError> {
        let file = self.read(unit)?;
        declared(unit, file.declare(builder))
    }
}

/// Units supplied in-process, keyed by location.
#[derive(Default)]
pub struct MemoryUnitSource {
    units: IndexMap<UnitPath, Box<dyn DeclarationUnit>>,
}

impl MemoryUnitSource {
    /// Empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `unit` at `location`, replacing any previous unit there.
    #[must_use]
    pub fn with<U>(mut self, location: impl Into<UnitPath>, unit: U) -> Self
    where
        U: DeclarationUnit + 'static,
    {
        self.units.insert(location.into(), Box::new(unit));
        self
    }

    /// Register a closure at `location`.
    #[must_use]
    pub fn with_fn<F>(self, location: impl Into<UnitPath>, unit: F) -> Self
    where
        F: Fn(&mut Builder<'_>) -> Result<Vec<UnitPath>, GraphError> + 'static,
    {
        self.with(location, unit)
    }
}

impl UnitSource for MemoryUnitSource {
    fn declare(
        &self,
        unit: &UnitPath,
        builder: &mut Builder<'_>,
    ) -> Result<Vec<UnitPath>, LoadError> {
        let Some(found) = self.units.get(unit) else {
            return Err(LoadError::unreadable(
                unit,
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no unit registered at `{unit}`"),
                ),
            ));
        };
        declared(unit, found.declare(builder))
    }
}
