//! Windows toolchain reached through a translated `/mnt/<drive>` mount.
//!
//! Binaries are invoked through their mounted POSIX path, while compiler and
//! linker flags must use the Windows `c:/...` spelling of the same
//! directories. Include and library directories are derived from where the
//! selected `cl.exe` and `rc.exe` live.

use camino::{Utf8Path, Utf8PathBuf};

use super::probe::{self, PathLister, Selection};
use super::{ToolchainError, Vars, flags};

/// Default mount point of the Windows program files directory.
pub const DEFAULT_WINDOWS_ROOT: &str = "/mnt/c/Program Files (x86)";

const SDK: &str = "Microsoft SDKs/Windows/v7.1A";
const WIN_LIBS: &[&str] = &["user32.lib"];

#[derive(Debug, Clone, Copy)]
enum Arch {
    X86,
    X64,
}

impl Arch {
    const fn dir(self) -> &'static str {
        match self {
            Self::X86 => "x86",
            Self::X64 => "x64",
        }
    }

    const fn bits(self) -> &'static str {
        match self {
            Self::X86 => "32",
            Self::X64 => "64",
        }
    }
}

/// Discovered binaries for one architecture.
struct Tools {
    arch: Arch,
    cl: Utf8PathBuf,
    link: Utf8PathBuf,
    rc: Utf8PathBuf,
}

impl Tools {
    fn probe(
        lister: &dyn PathLister,
        root: &Utf8Path,
        arch: Arch,
        selection: Selection,
    ) -> Result<Self, ToolchainError> {
        let base = probe::literal(root);
        let bits = arch.bits();
        let msvc = |exe: &str| {
            format!(
                "{base}/Microsoft Visual Studio/*/*/VC/Tools/MSVC/*/bin/Hostx86/{}/{exe}",
                arch.dir()
            )
        };
        let kits = format!("{base}/Windows Kits/*/bin/*/{}/rc.exe", arch.dir());
        Ok(Self {
            arch,
            cl: probe::require(lister, &format!("WIN_CL{bits}"), &msvc("cl.exe"), selection)?,
            link: probe::require(lister, &format!("WIN_LINK{bits}"), &msvc("link.exe"), selection)?,
            rc: probe::require(lister, &format!("WIN_RC{bits}"), &kits, selection)?,
        })
    }

    /// `<msvc>/bin/Hostx86/<arch>/cl.exe` → `<msvc>`.
    fn msvc_dir(&self) -> Result<&Utf8Path, ToolchainError> {
        ancestor(&self.cl, 4, "cl.exe")
    }

    /// `<kits>/bin/<version>/<arch>/rc.exe` → (`<kits>`, `<version>`).
    fn kits_dir(&self) -> Result<(&Utf8Path, &str), ToolchainError> {
        let versioned = ancestor(&self.rc, 2, "rc.exe")?;
        let version = versioned.file_name().ok_or_else(|| layout("rc.exe", &self.rc))?;
        Ok((ancestor(&self.rc, 4, "rc.exe")?, version))
    }

    fn lflags(&self, root: &Utf8Path) -> Result<String, ToolchainError> {
        let arch = self.arch.dir();
        let (kits, version) = self.kits_dir()?;
        let sdk_lib = match self.arch {
            Arch::X86 => root.join(SDK).join("Lib"),
            Arch::X64 => root.join(SDK).join("Lib").join("x64"),
        };
        let dirs = [
            sdk_lib,
            self.msvc_dir()?.join("lib").join(arch),
            kits.join("Lib").join(version).join("ucrt").join(arch),
        ];
        Ok(dirs
            .iter()
            .map(|dir| format!("/LIBPATH:{}", quoted(&windows_path(dir))))
            .chain(WIN_LIBS.iter().map(|lib| (*lib).to_owned()))
            .collect::<Vec<_>>()
            .join(" "))
    }

    fn bind(&self, vars: &mut Vars) {
        let bits = self.arch.bits();
        for (name, path) in [("CL", &self.cl), ("LINK", &self.link), ("RC", &self.rc)] {
            vars.insert(format!("WIN_{name}{bits}"), quoted(&escape(path.as_str())));
        }
    }
}

fn ancestor<'a>(path: &'a Utf8Path, n: usize, tool: &str) -> Result<&'a Utf8Path, ToolchainError> {
    path.ancestors()
        .nth(n)
        .filter(|dir| !dir.as_str().is_empty())
        .ok_or_else(|| layout(tool, path))
}

fn layout(tool: &str, path: &Utf8Path) -> ToolchainError {
    ToolchainError::UnexpectedLayout {
        tool: tool.to_owned(),
        path: path.to_string(),
    }
}

/// Bind the `WIN_*` variables, probing under `root`.
///
/// # Errors
///
/// Returns [`ToolchainError::NotFound`] when any of the six binaries is
/// missing.
pub(super) fn resolve(
    lister: &dyn PathLister,
    root: &Utf8Path,
    selection: Selection,
    vars: &mut Vars,
) -> Result<(), ToolchainError> {
    let x86 = Tools::probe(lister, root, Arch::X86, selection)?;
    let x64 = Tools::probe(lister, root, Arch::X64, selection)?;
    x86.bind(vars);
    x64.bind(vars);

    let (kits, version) = x86.kits_dir()?;
    let includes = [
        root.join(SDK).join("Include"),
        x86.msvc_dir()?.join("include"),
        kits.join("Include").join(version).join("ucrt"),
    ];
    let cflags = flags::COMMON
        .iter()
        .map(|flag| (*flag).to_owned())
        .chain(
            includes
                .iter()
                .flat_map(|dir| ["-I".to_owned(), quoted(&windows_path(dir))]),
        )
        .collect::<Vec<_>>()
        .join(" ");
    vars.insert("WIN_CFLAGS".to_owned(), cflags);
    vars.insert("WIN_LFLAGS32".to_owned(), x86.lflags(root)?);
    vars.insert("WIN_LFLAGS64".to_owned(), x64.lflags(root)?);
    Ok(())
}

/// Spell a mounted path the way Windows tools expect it.
///
/// ```
/// use camino::Utf8Path;
/// use kumiki::toolchain::windows_path;
///
/// assert_eq!(
///     windows_path(Utf8Path::new("/mnt/c/Program Files (x86)/Windows Kits")),
///     "c:/Program Files (x86)/Windows Kits"
/// );
/// assert_eq!(windows_path(Utf8Path::new("/opt/sdk")), "/opt/sdk");
/// ```
#[must_use]
pub fn windows_path(path: &Utf8Path) -> String {
    let text = path.as_str();
    let translated = text.strip_prefix("/mnt/").and_then(|rest| {
        let mut chars = rest.chars();
        let drive = chars.next().filter(char::is_ascii_alphabetic)?;
        let tail = chars.as_str();
        match tail {
            "" => Some(format!("{drive}:/")),
            _ if tail.starts_with('/') => Some(format!("{drive}:{tail}")),
            _ => None,
        }
    });
    translated.unwrap_or_else(|| text.to_owned())
}

fn quoted(value: &str) -> String {
    format!("\"{value}\"")
}

fn escape(value: &str) -> String {
    value.replace('$', "$$")
}
