//! Scripted [`Host`] used by unit and integration tests.

use std::{
    io,
    path::PathBuf,
    process::{Command, ExitStatus, Output},
};

use crate::process::{self, Host};

#[derive(Debug, Clone)]
pub struct Call {
    pub program: String,
    pub args: Vec<String>,
    pub set_env: Vec<(String, String)>,
    pub removed_env: Vec<String>,
}

impl Call {
    pub fn line(&self) -> String {
        if self.args.is_empty() {
            return self.program.clone();
        }
        format!("{} {}", self.program, self.args.join(" "))
    }
}

#[derive(Debug)]
struct Rule {
    pattern: String,
    code: i32,
    stdout: String,
    stderr: String,
    spawn_error: bool,
    remaining: Option<usize>,
}

/// Answers every command with exit code 0 and empty output unless a rule
/// whose pattern occurs in the command line says otherwise. Rules are checked
/// in insertion order; `*_once` rules are consumed by their first match.
#[derive(Debug, Default)]
pub struct ScriptedHost {
    pub calls: Vec<Call>,
    rules: Vec<Rule>,
    on_path: Vec<(String, PathBuf)>,
}

impl ScriptedHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn rule(mut self, pattern: &str, code: i32, stdout: &str, stderr: &str, once: bool) -> Self {
        self.rules.push(Rule {
            pattern: pattern.to_string(),
            code,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            spawn_error: false,
            remaining: once.then_some(1),
        });
        self
    }

    pub fn exit(self, pattern: &str, code: i32) -> Self {
        self.rule(pattern, code, "", "", false)
    }

    pub fn exit_once(self, pattern: &str, code: i32) -> Self {
        self.rule(pattern, code, "", "", true)
    }

    pub fn stdout(self, pattern: &str, text: &str) -> Self {
        self.rule(pattern, 0, text, "", false)
    }

    pub fn respond(self, pattern: &str, code: i32, stdout: &str, stderr: &str) -> Self {
        self.rule(pattern, code, stdout, stderr, false)
    }

    pub fn spawn_error(mut self, pattern: &str) -> Self {
        self.rules.push(Rule {
            pattern: pattern.to_string(),
            code: 0,
            stdout: String::new(),
            stderr: String::new(),
            spawn_error: true,
            remaining: None,
        });
        self
    }

    pub fn on_path(mut self, program: &str, path: impl Into<PathBuf>) -> Self {
        self.on_path.push((program.to_string(), path.into()));
        self
    }

    pub fn count(&self, pattern: &str) -> usize {
        self.calls.iter().filter(|c| c.line().contains(pattern)).count()
    }

    pub fn lines(&self) -> Vec<String> {
        self.calls.iter().map(Call::line).collect()
    }

    fn answer(&mut self, cmd: &Command) -> io::Result<Output> {
        let (program, args) = process::describe(cmd);
        let mut set_env = Vec::new();
        let mut removed_env = Vec::new();
        for (key, value) in cmd.get_envs() {
            let key = key.to_string_lossy().to_string();
            match value {
                Some(v) => set_env.push((key, v.to_string_lossy().to_string())),
                None => removed_env.push(key),
            }
        }
        let call = Call {
            program,
            args,
            set_env,
            removed_env,
        };
        let line = call.line();
        self.calls.push(call);

        let rule = self
            .rules
            .iter_mut()
            .find(|r| r.remaining != Some(0) && line.contains(&r.pattern));
        let Some(rule) = rule else {
            return Ok(output(0, "", ""));
        };
        if let Some(n) = rule.remaining.as_mut() {
            *n -= 1;
        }
        if rule.spawn_error {
            return Err(io::Error::new(io::ErrorKind::NotFound, "program not found"));
        }
        Ok(output(rule.code, &rule.stdout, &rule.stderr))
    }
}

impl Host for ScriptedHost {
    fn status(&mut self, cmd: &mut Command) -> io::Result<ExitStatus> {
        self.answer(cmd).map(|out| out.status)
    }

    fn output(&mut self, cmd: &mut Command) -> io::Result<Output> {
        self.answer(cmd)
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        self.on_path
            .iter()
            .find(|(name, _)| name == program)
            .map(|(_, path)| path.clone())
    }
}

fn output(code: i32, stdout: &str, stderr: &str) -> Output {
    Output {
        status: exit_status(code),
        stdout: stdout.as_bytes().to_vec(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

pub fn exit_status(code: i32) -> ExitStatus {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        ExitStatus::from_raw(code << 8)
    }
    #[cfg(windows)]
    {
        use std::os::windows::process::ExitStatusExt;
        ExitStatus::from_raw(code as u32)
    }
}
