//! Scratch declaration trees on disk.

use std::fs;

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

/// A temporary directory holding a declaration tree.
///
/// ```rust,ignore
/// let project = Project::new()?
///     .unit(".", "include: [posix]\n")?
///     .unit("posix", "build:\n  - copy: { target: a, source: b }\n")?;
/// ```
#[derive(Debug)]
pub struct Project {
    dir: TempDir,
    root: Utf8PathBuf,
}

impl Project {
    /// Create an empty tree.
    ///
    /// # Errors
    ///
    /// Fails if the temporary directory cannot be created or its path is not
    /// UTF-8.
    pub fn new() -> Result<Self> {
        let dir = TempDir::new().context("create project directory")?;
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .map_err(|path| anyhow::anyhow!("non UTF-8 temp dir {}", path.display()))?;
        Ok(Self { dir, root })
    }

    /// Write the `BUILD` file for `location`, creating directories as needed.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be written.
    pub fn unit(self, location: &str, yaml: &str) -> Result<Self> {
        let dir = self.root.join(location);
        fs::create_dir_all(&dir).with_context(|| format!("create {dir}"))?;
        let file = dir.join("BUILD");
        fs::write(&file, yaml).with_context(|| format!("write {file}"))?;
        Ok(self)
    }

    /// Root of the tree.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// The generated build file, if any.
    pub fn ninja_file(&self) -> Utf8PathBuf {
        self.root.join("build.ninja")
    }

    /// Read the generated build file.
    ///
    /// # Errors
    ///
    /// Fails if the generator has not written one.
    pub fn read_ninja(&self) -> Result<String> {
        let path = self.ninja_file();
        fs::read_to_string(&path).with_context(|| format!("read {path}"))
    }

    /// Root as a `std` path.
    pub fn path(&self) -> &std::path::Path {
        self.dir.path()
    }
}
