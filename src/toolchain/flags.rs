//! Native compiler flag sets.

use super::Host;

/// Optimisation and include paths shared by every compiler.
pub(super) const COMMON: &[&str] = &["-O2", "-I", "$src", "-I", "$dst"];

const MINIMIZE: &[&str] = &[
    "-s",
    "-fno-exceptions",
    "-ffreestanding",
    "-fno-stack-protector",
    "-fomit-frame-pointer",
    "-fno-ident",
    "-ffunction-sections",
    "-fdata-sections",
    "-fmerge-all-constants",
];

const BASE: &[&str] = &[
    "-std=c++11",
    "-Wall",
    "-Werror",
    "-no-pie",
    "-Wl,--gc-sections",
];

const LINUX_BUILD_ID: &str = "-Wl,--build-id=none";

const LINUX_LINK: &[&str] = &["-s", "-Wl,--gc-sections", "-no-pie", LINUX_BUILD_ID];

const DARWIN_LINK: &[&str] = &["-Wl,-dead_strip", "-D_GNU_SOURCE"];

const LINUX_STRIP: &[&str] = &[
    "--strip-unneeded",
    "--remove-section=.note.gnu.gold-version",
    "--remove-section=.comment",
    "--remove-section=.note",
    "--remove-section=.note.gnu.build-id",
    "--remove-section=.note.ABI-tag",
];

/// Native C++ compiler command.
pub(super) const CXX: &str = "g++";

/// Libraries every native link pulls in.
pub(super) const LIBS: &[&str] = &["-ldl"];

/// Compiler flags for native builds on `host`.
pub(super) fn cflags(host: Host) -> Vec<&'static str> {
    let mut flags: Vec<&str> = COMMON.iter().chain(MINIMIZE).copied().collect();
    if host == Host::Linux {
        flags.push(LINUX_BUILD_ID);
    }
    flags.extend(BASE);
    match host {
        Host::Linux => flags.extend(LINUX_LINK),
        Host::Darwin => flags.extend(DARWIN_LINK),
        Host::Other => {}
    }
    flags
}

/// Arguments passed to `strip` after each native link.
pub(super) fn strip_args(host: Host) -> Vec<&'static str> {
    let mut args = vec!["-S"];
    match host {
        Host::Linux => args.extend(LINUX_STRIP),
        Host::Darwin => args.push("-x"),
        Host::Other => {}
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Host::Linux, true)]
    #[case(Host::Darwin, false)]
    #[case(Host::Other, false)]
    fn build_id_is_suppressed_on_linux_only(#[case] host: Host, #[case] expected: bool) {
        assert_eq!(cflags(host).contains(&LINUX_BUILD_ID), expected);
    }

    #[test]
    fn darwin_strips_dead_code() {
        let flags = cflags(Host::Darwin);
        assert!(flags.contains(&"-Wl,-dead_strip"));
        assert_eq!(flags.first(), Some(&"-O2"));
        assert_eq!(strip_args(Host::Darwin), ["-S", "-x"]);
    }

    #[test]
    fn other_hosts_get_common_flags_only() {
        assert_eq!(strip_args(Host::Other), ["-S"]);
        assert!(cflags(Host::Other).ends_with(BASE));
    }
}
