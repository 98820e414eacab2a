//! Reading the configuration from the real process environment.

use anyhow::{Result, ensure};
use kumiki::config::{Config, ConfigError};
use kumiki::ninja_gen::UnresolvedPolicy;
use kumiki::toolchain::Selection;
use kumiki_env::{CROSS_ENV, ROOT_ENV, SELECT_ENV, STRICT_ENV, WIN_ROOT_ENV};
use serial_test::serial;
use test_support::EnvLock;

#[test]
#[serial]
fn unset_environment_gives_defaults() -> Result<()> {
    let _lock = EnvLock::isolated();
    let config = Config::from_env()?;
    ensure!(config.root == ".");
    ensure!(config.cross);
    ensure!(config.selection == Selection::First);
    ensure!(config.policy() == UnresolvedPolicy::PassThrough);
    Ok(())
}

#[test]
#[serial]
fn every_setting_is_read() -> Result<()> {
    let mut lock = EnvLock::isolated();
    lock.set(ROOT_ENV, "../tree")
        .set(CROSS_ENV, "no")
        .set(WIN_ROOT_ENV, "/mnt/d/Programs")
        .set(SELECT_ENV, "latest")
        .set(STRICT_ENV, "yes");
    let config = Config::from_env()?;
    ensure!(config.root == "../tree");
    ensure!(!config.cross);
    ensure!(config.windows_root == "/mnt/d/Programs");
    ensure!(config.selection == Selection::Latest);
    ensure!(config.strict);
    ensure!(
        config
            .regen_env()
            .starts_with("KUMIKI_ROOT=$src KUMIKI_CROSS=0 KUMIKI_WIN_ROOT=/mnt/d/Programs KUMIKI_TOOLCHAIN_SELECT=latest KUMIKI_STRICT_VARS=1"),
        "regeneration must reproduce the run"
    );
    Ok(())
}

#[test]
#[serial]
fn overrides_are_restored_when_the_lock_drops() -> Result<()> {
    {
        let mut lock = EnvLock::isolated();
        lock.set(STRICT_ENV, "maybe");
        let err = Config::from_env().err();
        ensure!(matches!(err, Some(ConfigError::InvalidConfig { variable, .. }) if variable == STRICT_ENV));
    }
    let _lock = EnvLock::isolated();
    ensure!(std::env::var_os(STRICT_ENV).is_none());
    ensure!(!Config::from_env()?.strict);
    Ok(())
}
