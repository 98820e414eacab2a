//! Command line interface definition using clap.
//!
//! The generator is configured through `KUMIKI_*` environment variables (see
//! [`crate::config`]); the command line only controls chatter.

use clap::Parser;

const ENVIRONMENT: &str = "\
Environment:
  KUMIKI_ROOT              declaration tree root [default: .]
  KUMIKI_CROSS             probe for the Windows cross toolchain (0/1) [default: 1]
  KUMIKI_WIN_ROOT          mounted Windows program files [default: /mnt/c/Program Files (x86)]
  KUMIKI_TOOLCHAIN_SELECT  first or latest [default: first]
  KUMIKI_STRICT_VARS       fail on undefined variables (0/1) [default: 0]
  KUMIKI_HOST              linux, darwin or other [default: build host]
  KUMIKI_LOG               log filter directive [default: warn]";

/// Compile a tree of BUILD declarations into a single Ninja build file.
#[derive(Debug, Default, Parser)]
#[command(name = "kumiki", author, version, about, long_about = None, after_long_help = ENVIRONMENT)]
pub struct Cli {
    /// Do not print the follow-up hint after writing build.ninja.
    #[arg(short, long)]
    pub quiet: bool,
}
