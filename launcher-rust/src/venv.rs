use anyhow::{bail, Context, Result};
use log::{info, warn};
use std::{
    env,
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
    process::Command,
};

use crate::process::{self, Host};

/// Makes a child interpreter drop into the REPL once its script ends.
pub const INSPECT_VAR: &str = "PYTHONINSPECT";

const BASE_PYTHON_CANDIDATES: [&str; 3] = ["python3", "python", "py"];

/// Environment applied to every child process instead of mutating our own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChildEnv {
    pub set: Vec<(String, OsString)>,
    pub remove: Vec<String>,
}

impl ChildEnv {
    pub fn for_venv(venv_dir: &Path, inherited_path: Option<OsString>) -> Result<Self> {
        let bin = bin_dir(venv_dir);
        let inherited = inherited_path.unwrap_or_default();
        let path = env::join_paths(std::iter::once(bin).chain(env::split_paths(&inherited)))
            .context("build PATH for virtual environment")?;
        Ok(Self {
            set: vec![
                ("VIRTUAL_ENV".to_string(), venv_dir.as_os_str().to_os_string()),
                ("PATH".to_string(), path),
            ],
            remove: vec![INSPECT_VAR.to_string(), "PYTHONHOME".to_string()],
        })
    }

    pub fn apply(&self, cmd: &mut Command) {
        for key in &self.remove {
            cmd.env_remove(key);
        }
        for (key, value) in &self.set {
            cmd.env(key, value);
        }
    }
}

/// An activated virtual environment rooted in the launcher directory.
#[derive(Debug, Clone)]
pub struct Environment {
    root: PathBuf,
    dir: PathBuf,
    python: PathBuf,
    child_env: ChildEnv,
}

impl Environment {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn python(&self) -> &Path {
        &self.python
    }

    /// A command running inside the environment, from the launcher root.
    pub fn command(&self, program: impl AsRef<OsStr>) -> Command {
        let mut c = Command::new(program);
        c.current_dir(&self.root);
        self.child_env.apply(&mut c);
        c
    }

    pub fn python_command(&self) -> Command {
        self.command(&self.python)
    }

    /// Path of a console script installed into the environment.
    pub fn script(&self, name: &str) -> PathBuf {
        bin_dir(&self.dir).join(format!("{name}{}", env::consts::EXE_SUFFIX))
    }
}

pub fn bin_dir(venv_dir: &Path) -> PathBuf {
    if cfg!(windows) {
        venv_dir.join("Scripts")
    } else {
        venv_dir.join("bin")
    }
}

pub fn venv_python(venv_dir: &Path) -> PathBuf {
    if cfg!(windows) {
        bin_dir(venv_dir).join("python.exe")
    } else {
        bin_dir(venv_dir).join("python")
    }
}

pub fn is_venv(venv_dir: &Path) -> bool {
    venv_dir.join("pyvenv.cfg").exists() && venv_python(venv_dir).exists()
}

/// Picks the interpreter used to create the environment.
pub fn find_base_python(host: &dyn Host, configured: &str) -> Result<PathBuf> {
    let configured = configured.trim();
    if !configured.is_empty() {
        let as_path = PathBuf::from(configured);
        if as_path.is_absolute() && as_path.exists() {
            return Ok(as_path);
        }
        return host
            .which(configured)
            .with_context(|| format!("configured python `{configured}` not found on PATH"));
    }
    for candidate in BASE_PYTHON_CANDIDATES {
        if let Some(path) = host.which(candidate) {
            return Ok(path);
        }
    }
    bail!(
        "no Python interpreter found on PATH (tried {})",
        BASE_PYTHON_CANDIDATES.join(", ")
    )
}

/// Creates `root/<dir_name>` when missing, then activates it.
pub fn ensure_venv(
    host: &mut dyn Host,
    root: &Path,
    dir_name: &str,
    configured_python: &str,
) -> Result<Environment> {
    let dir = root.join(dir_name);
    if is_venv(&dir) {
        info!("using virtual environment at {}", dir.display());
    } else {
        let base = find_base_python(host, configured_python)?;
        info!(
            "creating virtual environment at {} with {}",
            dir.display(),
            base.display()
        );
        let mut create = Command::new(&base);
        create
            .current_dir(root)
            .env_remove(INSPECT_VAR)
            .arg("-m")
            .arg("venv")
            .arg(&dir);
        process::run_checked(host, &mut create)
            .with_context(|| format!("create virtual environment at {}", dir.display()))?;
    }
    activate(host, root, &dir)
}

/// Builds the child environment for `dir` and checks its interpreter starts.
pub fn activate(host: &mut dyn Host, root: &Path, dir: &Path) -> Result<Environment> {
    let child_env = ChildEnv::for_venv(dir, env::var_os("PATH"))?;
    let environment = Environment {
        root: root.to_path_buf(),
        dir: dir.to_path_buf(),
        python: venv_python(dir),
        child_env,
    };

    let mut check = environment.python_command();
    check.arg("--version");
    let out = process::check_output(host, &mut check)
        .with_context(|| format!("activate virtual environment at {}", dir.display()))?;
    let version = String::from_utf8_lossy(&out.stdout).trim().to_string();
    if version.is_empty() {
        warn!("interpreter at {} printed no version", environment.python.display());
    } else {
        info!("virtual environment ready ({version})");
    }
    Ok(environment)
}
