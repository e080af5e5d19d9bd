use log::{debug, info, warn};
use std::{
    fmt,
    path::{Path, PathBuf},
    process::Command,
};

use crate::{
    process::{self, CommandError, Host},
    venv::Environment,
};

/// Package installer chosen once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Installer {
    /// `python -m pip` inside the virtual environment.
    Pip,
    /// A `uv` binary found on `PATH`.
    Uv(PathBuf),
    None,
}

impl fmt::Display for Installer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Installer::Pip => write!(f, "pip"),
            Installer::Uv(path) => write!(f, "uv ({})", path.display()),
            Installer::None => write!(f, "none"),
        }
    }
}

/// One entry of the installer fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveStep {
    ProbePip,
    /// Provision pip with `ensurepip`, then probe again.
    BootstrapPip,
    ProbeUv,
}

pub const RESOLUTION_ORDER: [ResolveStep; 3] = [
    ResolveStep::ProbePip,
    ResolveStep::BootstrapPip,
    ResolveStep::ProbeUv,
];

impl ResolveStep {
    fn attempt(self, host: &mut dyn Host, env: &Environment) -> Option<Installer> {
        match self {
            ResolveStep::ProbePip => pip_available(host, env).then_some(Installer::Pip),
            ResolveStep::BootstrapPip => {
                bootstrap_pip(host, env);
                pip_available(host, env).then_some(Installer::Pip)
            }
            ResolveStep::ProbeUv => host.which("uv").map(Installer::Uv),
        }
    }
}

/// Walks [`RESOLUTION_ORDER`] until a step yields an installer.
pub fn resolve_installer(host: &mut dyn Host, env: &Environment) -> Installer {
    for step in RESOLUTION_ORDER {
        if let Some(installer) = step.attempt(host, env) {
            info!("package installer: {installer} (via {step:?})");
            return installer;
        }
        debug!("{step:?} found no installer");
    }
    warn!("no package installer available (pip missing and uv not on PATH)");
    Installer::None
}

pub fn pip_available(host: &mut dyn Host, env: &Environment) -> bool {
    let mut cmd = pip_command(env);
    cmd.arg("--version");
    process::probe(host, &mut cmd)
}

fn bootstrap_pip(host: &mut dyn Host, env: &Environment) {
    info!("pip not available, running ensurepip");
    let mut cmd = env.python_command();
    cmd.arg("-m").arg("ensurepip").arg("--upgrade");
    if let Err(err) = process::run_checked(host, &mut cmd) {
        warn!("ensurepip failed: {err}");
    }
}

fn pip_command(env: &Environment) -> Command {
    let mut cmd = env.python_command();
    cmd.arg("-m").arg("pip");
    cmd
}

fn uv_pip_install(env: &Environment, uv: &Path) -> Command {
    let mut cmd = env.command(uv);
    cmd.arg("pip")
        .arg("install")
        .arg("--python")
        .arg(env.python());
    cmd
}

/// `install --upgrade` command for `installer`, or `None` when nothing can install.
pub fn install_command(env: &Environment, installer: &Installer) -> Option<Command> {
    let mut cmd = match installer {
        Installer::Pip => {
            let mut cmd = pip_command(env);
            cmd.arg("install");
            cmd
        }
        Installer::Uv(uv) => uv_pip_install(env, uv),
        Installer::None => return None,
    };
    cmd.arg("--upgrade");
    Some(cmd)
}

/// Installs the manifest with `installer`. Failures are logged, never returned.
pub fn install_dependencies(
    host: &mut dyn Host,
    env: &Environment,
    installer: &Installer,
    manifest: &Path,
) {
    if *installer == Installer::None {
        warn!("skipping dependency install: no package installer available");
        return;
    }
    if !manifest.exists() {
        warn!(
            "skipping dependency install: {} not found",
            manifest.display()
        );
        return;
    }

    info!("installing dependencies from {} with {installer}", manifest.display());
    if *installer == Installer::Pip {
        if let Err(err) = upgrade_pip(host, env) {
            warn!("pip self-upgrade failed, installing with the current pip: {err}");
        }
    }
    let Some(mut install) = install_command(env, installer) else {
        return;
    };
    install.arg("-r").arg(manifest);
    match process::run_checked(host, &mut install) {
        Ok(()) => info!("dependencies installed"),
        Err(err) => warn!("dependency install failed, continuing: {err}"),
    }
}

fn upgrade_pip(host: &mut dyn Host, env: &Environment) -> Result<(), CommandError> {
    let mut cmd = pip_command(env);
    cmd.arg("install").arg("--upgrade").arg("pip");
    process::run_checked(host, &mut cmd)
}
