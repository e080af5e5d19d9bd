use log::debug;
use std::{
    io,
    path::PathBuf,
    process::{Command, ExitStatus, Output, Stdio},
};
use thiserror::Error;

/// Everything the launcher needs from the operating system to run external tools.
///
/// The orchestrator only talks to the outside world through this trait so the
/// whole pipeline can be driven by a scripted host in tests.
pub trait Host {
    /// Runs the command to completion with inherited stdio.
    fn status(&mut self, cmd: &mut Command) -> io::Result<ExitStatus>;
    /// Runs the command to completion and captures stdout/stderr.
    fn output(&mut self, cmd: &mut Command) -> io::Result<Output>;
    /// Looks a program up on `PATH`.
    fn which(&self, program: &str) -> Option<PathBuf>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHost;

impl Host for SystemHost {
    fn status(&mut self, cmd: &mut Command) -> io::Result<ExitStatus> {
        cmd.status()
    }

    fn output(&mut self, cmd: &mut Command) -> io::Result<Output> {
        cmd.stdin(Stdio::null()).output()
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("`{}` failed with exit code {}", command_line(.command, .args), exit_label(.code))]
    Failed {
        command: String,
        args: Vec<String>,
        code: Option<i32>,
    },
}

impl CommandError {
    #[cfg(test)]
    pub fn code(&self) -> Option<i32> {
        match self {
            CommandError::Spawn { .. } => None,
            CommandError::Failed { code, .. } => *code,
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "unknown (terminated by signal)".to_string(),
    }
}

fn command_line(command: &str, args: &[String]) -> String {
    if args.is_empty() {
        return command.to_string();
    }
    format!("{command} {}", args.join(" "))
}

/// Program name and arguments of a command, lossily converted for messages.
pub fn describe(cmd: &Command) -> (String, Vec<String>) {
    let program = cmd.get_program().to_string_lossy().to_string();
    let args = cmd
        .get_args()
        .map(|a| a.to_string_lossy().to_string())
        .collect();
    (program, args)
}

#[cfg(test)]
pub fn display(cmd: &Command) -> String {
    let (program, args) = describe(cmd);
    command_line(&program, &args)
}

/// Runs `cmd` and turns a non-zero exit status into [`CommandError::Failed`].
pub fn run_checked(host: &mut dyn Host, cmd: &mut Command) -> Result<(), CommandError> {
    let (command, args) = describe(cmd);
    debug!("running {}", command_line(&command, &args));
    let status = host
        .status(cmd)
        .map_err(|source| CommandError::Spawn {
            command: command.clone(),
            source,
        })?;
    if status.success() {
        return Ok(());
    }
    Err(CommandError::Failed {
        command,
        args,
        code: status.code(),
    })
}

/// Runs `cmd` with captured output. The exit status is left to the caller.
pub fn capture(host: &mut dyn Host, cmd: &mut Command) -> Result<Output, CommandError> {
    let (command, args) = describe(cmd);
    debug!("capturing {}", command_line(&command, &args));
    host.output(cmd)
        .map_err(|source| CommandError::Spawn { command, source })
}

/// Runs `cmd` with captured output and treats a non-zero exit status as an error.
pub fn check_output(host: &mut dyn Host, cmd: &mut Command) -> Result<Output, CommandError> {
    let out = capture(host, cmd)?;
    if out.status.success() {
        return Ok(out);
    }
    let (command, args) = describe(cmd);
    Err(CommandError::Failed {
        command,
        args,
        code: out.status.code(),
    })
}

/// Runs `cmd` quietly and reports whether it exited successfully.
pub fn probe(host: &mut dyn Host, cmd: &mut Command) -> bool {
    match capture(host, cmd) {
        Ok(out) => out.status.success(),
        Err(err) => {
            debug!("probe failed: {err}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedHost;

    #[test]
    fn run_checked_accepts_zero_exit() {
        let mut host = ScriptedHost::new();
        let mut cmd = Command::new("python");
        cmd.arg("yt_dlp_gui.py");
        run_checked(&mut host, &mut cmd).unwrap();
        assert_eq!(host.lines(), vec!["python yt_dlp_gui.py".to_string()]);
    }

    #[test]
    fn run_checked_reports_nonzero_exit() {
        let mut host = ScriptedHost::new().exit("yt_dlp_gui.py", 2);
        let mut cmd = Command::new("python");
        cmd.arg("yt_dlp_gui.py");
        let err = run_checked(&mut host, &mut cmd).unwrap_err();
        assert_eq!(err.code(), Some(2));
        let msg = err.to_string();
        assert!(msg.contains("python"));
        assert!(msg.contains('2'));
    }

    #[test]
    fn run_checked_reports_spawn_failure() {
        let mut host = ScriptedHost::new().spawn_error("missing-tool");
        let mut cmd = Command::new("missing-tool");
        let err = run_checked(&mut host, &mut cmd).unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
        assert!(err.to_string().contains("missing-tool"));
    }

    #[test]
    fn check_output_rejects_failure_but_probe_only_reports() {
        let mut host = ScriptedHost::new().exit("--version", 1);
        let mut cmd = Command::new("python");
        cmd.arg("--version");
        assert!(check_output(&mut host, &mut cmd).is_err());
        assert!(!probe(&mut host, &mut cmd));
    }

    #[test]
    fn failed_message_names_command_and_code() {
        let err = CommandError::Failed {
            command: "python".to_string(),
            args: vec!["yt_dlp_gui.py".to_string()],
            code: Some(2),
        };
        let msg = err.to_string();
        assert!(msg.contains("python yt_dlp_gui.py"));
        assert!(msg.contains("exit code 2"));
        assert_eq!(err.code(), Some(2));
    }

    #[test]
    fn failed_message_without_code() {
        let err = CommandError::Failed {
            command: "uv".to_string(),
            args: Vec::new(),
            code: None,
        };
        assert!(err.to_string().contains("terminated by signal"));
    }

    #[test]
    fn describe_lists_program_and_args() {
        let mut cmd = Command::new("python");
        cmd.arg("-m").arg("pip");
        let (program, args) = describe(&cmd);
        assert_eq!(program, "python");
        assert_eq!(args, vec!["-m".to_string(), "pip".to_string()]);
        assert_eq!(display(&cmd), "python -m pip");
    }
}
