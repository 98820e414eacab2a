//! Synthetic toolchain installations.

use kumiki::toolchain::{DEFAULT_WINDOWS_ROOT, StaticLister};

/// Visual Studio edition directory used by [`windows_install`].
pub const EDITION: &str = "Microsoft Visual Studio/2019/Community";

/// Windows Kits version used by [`windows_install`].
pub const KITS_VERSION: &str = "10.0.19041.0";

/// A listing with one MSVC install per entry of `msvc_versions` and one
/// Windows Kits install, all below the default Windows root.
pub fn windows_install(msvc_versions: &[&str]) -> StaticLister {
    let mut entries = Vec::new();
    for version in msvc_versions {
        let msvc = format!("{DEFAULT_WINDOWS_ROOT}/{EDITION}/VC/Tools/MSVC/{version}");
        for arch in ["x86", "x64"] {
            entries.push(format!("{msvc}/bin/Hostx86/{arch}/cl.exe"));
            entries.push(format!("{msvc}/bin/Hostx86/{arch}/link.exe"));
        }
    }
    for arch in ["x86", "x64"] {
        entries.push(format!(
            "{DEFAULT_WINDOWS_ROOT}/Windows Kits/10/bin/{KITS_VERSION}/{arch}/rc.exe"
        ));
    }
    StaticLister::new(entries)
}
