use anyhow::{Context, Result};
use env_logger::{Env, Target};
use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

const LOG_FILE_NAME: &str = "launcher.log";

pub fn logs_dir(root: &Path) -> PathBuf {
    root.join("logs")
}

fn open_log_file(root: &Path) -> Result<(PathBuf, File)> {
    let dir = logs_dir(root);
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    let log_path = dir.join(LOG_FILE_NAME);
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("open {}", log_path.display()))?;
    Ok((log_path, file))
}

/// Sends every record to the console and to `logs/launcher.log`.
/// `RUST_LOG` overrides the default `info` level.
pub fn init(root: &Path) -> Result<PathBuf> {
    let (log_path, file) = open_log_file(root)?;
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .target(Target::Pipe(Box::new(Tee {
            console: io::stderr(),
            file,
        })))
        .try_init()
        .context("install logger")?;
    Ok(log_path)
}

pub fn is_initialized() -> bool {
    log::max_level() != log::LevelFilter::Off
}

struct Tee<C, F> {
    console: C,
    file: F,
}

impl<C: Write, F: Write> Write for Tee<C, F> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // A closed console must not stop file logging.
        let _ = self.console.write_all(buf);
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let _ = self.console.flush();
        self.file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_log_file_creates_file() {
        let tmp = tempfile::tempdir().unwrap();
        let (log_path, _file) = open_log_file(tmp.path()).unwrap();
        assert!(log_path.exists());
        assert_eq!(log_path, logs_dir(tmp.path()).join(LOG_FILE_NAME));
    }

    #[test]
    fn tee_writes_both_sides() {
        let tmp = tempfile::tempdir().unwrap();
        let (log_path, file) = open_log_file(tmp.path()).unwrap();
        let mut tee = Tee {
            console: Vec::new(),
            file,
        };
        tee.write_all(b"stage Init -> EnvironmentReady\n").unwrap();
        tee.flush().unwrap();

        assert_eq!(tee.console, b"stage Init -> EnvironmentReady\n");
        let logged = fs::read_to_string(&log_path).unwrap();
        assert!(logged.contains("EnvironmentReady"));
    }
}
