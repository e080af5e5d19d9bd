use anyhow::{bail, Result};
use std::{fmt, process::Command};

use crate::venv::Environment;

/// How the GUI is started inside the virtual environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryPoint {
    PythonFile(String),
    Module(String),
    Command(String),
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryPoint::PythonFile(file) => write!(f, "{file}"),
            EntryPoint::Module(module) => write!(f, "module:{module}"),
            EntryPoint::Command(cmd) => write!(f, "command:{cmd}"),
        }
    }
}

/// Entry points that name something other than a script under the root.
const PREFIXED: [(&str, fn(String) -> EntryPoint); 2] = [
    ("module:", EntryPoint::Module),
    ("command:", EntryPoint::Command),
];

/// A bare value is a script path; `module:` and `command:` select the other kinds.
pub fn parse_entry_point(raw: &str) -> Result<EntryPoint> {
    let raw = raw.trim();
    for (prefix, kind) in PREFIXED {
        if let Some(value) = raw.strip_prefix(prefix) {
            let value = value.trim();
            if value.is_empty() {
                bail!("entry_point `{prefix}` names nothing");
            }
            return Ok(kind(value.to_string()));
        }
    }
    if raw.is_empty() {
        bail!("entry_point is empty");
    }
    Ok(EntryPoint::PythonFile(raw.to_string()))
}

/// Foreground command for the GUI. A script entry point must exist under the root.
pub fn launch_command(env: &Environment, entry: &EntryPoint) -> Result<Command> {
    let cmd = match entry {
        EntryPoint::PythonFile(file) => {
            let path = env.root().join(file);
            if !path.is_file() {
                bail!("GUI entry point not found: {}", path.display());
            }
            let mut cmd = env.python_command();
            cmd.arg(path);
            cmd
        }
        EntryPoint::Module(module) => {
            let mut cmd = env.python_command();
            cmd.arg("-m").arg(module);
            cmd
        }
        EntryPoint::Command(name) => env.command(env.script(name)),
    };
    Ok(cmd)
}
