use serde::Deserialize;
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

const DEFAULT_ENTRY_POINT: &str = "yt_dlp_gui.py";
const DEFAULT_REQUIREMENTS: &str = "requirements.txt";
const DEFAULT_VENV_DIR: &str = "venv";
const DEFAULT_RELEASE_API_URL: &str = "https://api.github.com/repos/yt-dlp/yt-dlp/releases/latest";

#[derive(Debug, Deserialize)]
struct Config {
    name: String,
    version: String,
    #[serde(default)]
    entry_point: String,
    #[serde(default)]
    requirements: String,
    #[serde(default)]
    venv_dir: String,
    #[serde(default)]
    python: String,
    #[serde(default)]
    release_api_url: String,
    #[serde(default = "default_true")]
    auto_update_enabled: bool,
}

fn default_true() -> bool {
    true
}

fn main() {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set");
    let manifest_dir = PathBuf::from(manifest_dir);
    let repo_root = manifest_dir.join("..");
    let config = load_config(&repo_root).unwrap_or_else(|err| {
        panic!("failed to load config.toml: {err}");
    });

    if let Err(err) = write_config_rs(&PathBuf::from(std::env::var("OUT_DIR").unwrap()), &config) {
        panic!("failed to write config: {err}");
    }
}

fn load_config(repo_root: &Path) -> io::Result<Config> {
    let config_path = repo_root.join("config.toml");
    println!("cargo:rerun-if-changed={}", config_path.display());
    let contents = fs::read_to_string(&config_path)?;
    let cfg: Config = toml::from_str(&contents)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
    if cfg.name.trim().is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "name is empty"));
    }
    Ok(cfg)
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback
    } else {
        trimmed
    }
}

fn write_config_rs(out_dir: &Path, config: &Config) -> io::Result<()> {
    let out_path = out_dir.join("launcher_config.rs");
    let mut file = fs::File::create(&out_path)?;
    writeln!(file, "pub const NAME: &str = {:?};", config.name.trim())?;
    writeln!(file, "pub const VERSION: &str = {:?};", config.version.trim())?;
    writeln!(
        file,
        "pub const ENTRY_POINT: &str = {:?};",
        or_default(&config.entry_point, DEFAULT_ENTRY_POINT)
    )?;
    writeln!(
        file,
        "pub const REQUIREMENTS: &str = {:?};",
        or_default(&config.requirements, DEFAULT_REQUIREMENTS)
    )?;
    writeln!(
        file,
        "pub const VENV_DIR: &str = {:?};",
        or_default(&config.venv_dir, DEFAULT_VENV_DIR)
    )?;
    writeln!(file, "pub const PYTHON: &str = {:?};", config.python.trim())?;
    writeln!(
        file,
        "pub const RELEASE_API_URL: &str = {:?};",
        or_default(&config.release_api_url, DEFAULT_RELEASE_API_URL)
    )?;
    writeln!(
        file,
        "pub const AUTO_UPDATE_ENABLED: bool = {:?};",
        config.auto_update_enabled
    )?;
    Ok(())
}
