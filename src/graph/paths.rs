//! Lexical path arithmetic for Ninja path strings.
//!
//! Paths handed to the builder usually start with a variable such as `$dst`
//! and cannot be canonicalised on disk. These helpers therefore work purely on
//! components: `$dst/a/b` relative to `$dst/a` is `b`.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};

/// Remove `.` components and fold `name/..` pairs.
///
/// Leading `..` components of a relative path are preserved.
///
/// ```
/// use camino::Utf8Path;
/// use kumiki::graph::normalize;
///
/// assert_eq!(normalize(Utf8Path::new("./a/./b/../c")), "a/c");
/// assert_eq!(normalize(Utf8Path::new("../x/..")), "..");
/// assert_eq!(normalize(Utf8Path::new(".")), ".");
/// ```
#[must_use]
pub fn normalize(path: &Utf8Path) -> Utf8PathBuf {
    let mut parts: Vec<Utf8Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => match parts.last() {
                Some(Utf8Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Utf8Component::RootDir | Utf8Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        return Utf8PathBuf::from(".");
    }
    parts.iter().collect()
}

/// Express `path` relative to `base` without touching the filesystem.
///
/// Returns `None` when the relation depends on the working directory: one
/// path is absolute and the other is not, or `base` climbs above the shared
/// prefix with `..`.
///
/// ```
/// use camino::Utf8Path;
/// use kumiki::graph::relative_to;
///
/// let rel = relative_to(Utf8Path::new("$dst/web/app.js"), Utf8Path::new("$dst/web"));
/// assert_eq!(rel.as_deref(), Some(Utf8Path::new("app.js")));
/// let up = relative_to(Utf8Path::new("$dst/a.zip"), Utf8Path::new("$dst/web"));
/// assert_eq!(up.as_deref(), Some(Utf8Path::new("../a.zip")));
/// ```
#[must_use]
pub fn relative_to(path: &Utf8Path, base: &Utf8Path) -> Option<Utf8PathBuf> {
    if path.is_absolute() != base.is_absolute() {
        return None;
    }
    let target = normalize(path);
    let from = normalize(base);
    let path_parts: Vec<_> = target
        .components()
        .filter(|c| *c != Utf8Component::CurDir)
        .collect();
    let base_parts: Vec<_> = from
        .components()
        .filter(|c| *c != Utf8Component::CurDir)
        .collect();
    let common = path_parts
        .iter()
        .zip(&base_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = Utf8PathBuf::new();
    for part in base_parts.iter().skip(common) {
        if *part == Utf8Component::ParentDir {
            return None;
        }
        relative.push("..");
    }
    for part in path_parts.iter().skip(common) {
        relative.push(part.as_str());
    }
    if relative.as_str().is_empty() {
        relative.push(".");
    }
    Some(relative)
}
