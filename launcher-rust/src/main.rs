mod config;
mod entry;
mod installer;
mod logging;
mod paths;
mod process;
mod runner;
#[cfg(test)]
mod testing;
mod update;
mod venv;

use anyhow::Result;
use log::{error, info};
use std::io::{self, BufRead, IsTerminal, Write};

fn main() {
    let code = match launch() {
        Ok(()) => 0,
        Err(err) => {
            report(&err);
            pause();
            1
        }
    };
    std::process::exit(code);
}

fn launch() -> Result<()> {
    let root = paths::root_dir()?;
    paths::enter_root(&root)?;
    let log_path = logging::init(&root)?;
    info!("starting {} launcher v{}", config::NAME, config::VERSION);
    info!("log file: {}", log_path.display());
    runner::run(&root)
}

fn report(err: &anyhow::Error) {
    if logging::is_initialized() {
        error!("{err:#}");
    } else {
        eprintln!("error: {err:#}");
    }
}

/// Keeps a double-clicked console window open long enough to read the error.
fn pause() {
    if !io::stdin().is_terminal() {
        return;
    }
    eprint!("Press Enter to close...");
    let _ = io::stderr().flush();
    let mut line = String::new();
    let _ = io::stdin().lock().read_line(&mut line);
}
