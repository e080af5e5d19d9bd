use anyhow::{Context, Result};
use log::info;
use std::path::Path;

use crate::{
    config::{self, Settings},
    entry, installer,
    process::{self, Host, SystemHost},
    update::{self, UpdateError},
    venv,
};

/// Position in the launch pipeline. Stages only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Init,
    EnvironmentReady,
    InstallerResolved,
    DependenciesHandled,
    VersionChecked,
    Launched,
}

pub fn run(root: &Path) -> Result<()> {
    let settings = Settings::from_build();
    run_with_host(root, &settings, &mut SystemHost, || {
        update::fetch_latest_release(config::RELEASE_API_URL)
    })
    .map(|_| ())
}

/// Runs the whole pipeline and returns the last stage reached.
pub fn run_with_host(
    root: &Path,
    settings: &Settings,
    host: &mut dyn Host,
    fetch_latest: impl FnOnce() -> Result<String, UpdateError>,
) -> Result<Stage> {
    let mut stage = Stage::Init;
    info!("launcher root: {}", root.display());

    let entry = entry::parse_entry_point(&settings.entry_point)
        .context("invalid entry_point in config.toml")?;

    let env = venv::ensure_venv(host, root, &settings.venv_dir, &settings.python)?;
    info!("virtual environment: {}", env.dir().display());
    advance(&mut stage, Stage::EnvironmentReady);

    let installer = installer::resolve_installer(host, &env);
    advance(&mut stage, Stage::InstallerResolved);

    installer::install_dependencies(host, &env, &installer, &root.join(&settings.requirements));
    advance(&mut stage, Stage::DependenciesHandled);

    if settings.auto_update_enabled {
        let outcome = update::check_for_update(host, &env, &installer, fetch_latest);
        info!("update check: {outcome:?}");
    } else {
        info!("update check disabled in config.toml");
    }
    advance(&mut stage, Stage::VersionChecked);

    let mut gui = entry::launch_command(&env, &entry)?;
    info!("launching {entry}");
    process::run_checked(host, &mut gui).context("GUI exited with an error")?;
    advance(&mut stage, Stage::Launched);

    Ok(stage)
}

fn advance(stage: &mut Stage, next: Stage) {
    debug_assert!(next > *stage, "stage went backwards: {stage:?} -> {next:?}");
    info!("stage {stage:?} -> {next:?}");
    *stage = next;
}
