use log::{info, warn};
use reqwest::{
    blocking::{Client, ClientBuilder},
    header::ACCEPT,
    StatusCode,
};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    config,
    installer::{self, Installer},
    process::{self, Host},
    venv::Environment,
};

/// Reported when the installed version cannot be read.
pub const UNKNOWN_VERSION: &str = "(unknown)";

const PACKAGE: &str = "yt-dlp";
const MODULE: &str = "yt_dlp";

#[derive(Debug, Deserialize)]
struct Release {
    #[serde(default)]
    tag_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("release request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("release API returned {0}")]
    Status(StatusCode),
    #[error("release metadata is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("release metadata has no tag_name")]
    MissingTag,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    UpToDate,
    Upgraded { from: String, to: String },
    UpgradeFailed,
    /// An upgrade was due but no installer could perform it.
    NoInstaller,
    /// The installed or the latest version could not be determined.
    Unavailable,
}

/// Reads the installed yt-dlp version from the environment.
pub fn installed_version(host: &mut dyn Host, env: &Environment) -> Result<String, process::CommandError> {
    let mut cmd = env.python_command();
    cmd.arg("-m").arg(MODULE).arg("--version");
    let out = process::capture(host, &mut cmd)?;
    if !out.status.success() {
        warn!(
            "{PACKAGE} --version exited with {:?}: {}",
            out.status.code(),
            String::from_utf8_lossy(&out.stderr).trim()
        );
        return Ok(UNKNOWN_VERSION.to_string());
    }
    Ok(version_from_output(&out.stdout, &out.stderr))
}

/// Trimmed stdout, else trimmed stderr, else [`UNKNOWN_VERSION`].
pub fn version_from_output(stdout: &[u8], stderr: &[u8]) -> String {
    [stdout, stderr]
        .iter()
        .map(|bytes| String::from_utf8_lossy(bytes).trim().to_string())
        .find(|s| !s.is_empty())
        .unwrap_or_else(|| UNKNOWN_VERSION.to_string())
}

/// Latest release tag from a GitHub release document, falling back to its name.
pub fn latest_from_json(body: &str) -> Result<String, UpdateError> {
    let release: Release = serde_json::from_str(body)?;
    [release.tag_name, release.name]
        .into_iter()
        .flatten()
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
        .ok_or(UpdateError::MissingTag)
}

fn client_builder() -> ClientBuilder {
    Client::builder().user_agent(config::user_agent())
}

pub fn fetch_latest_release(url: &str) -> Result<String, UpdateError> {
    fetch_with(&client_builder().build()?, url)
}

fn fetch_with(client: &Client, url: &str) -> Result<String, UpdateError> {
    let resp = client
        .get(url)
        .header(ACCEPT, "application/vnd.github+json")
        .send()?;
    let status = resp.status();
    if !status.is_success() {
        return Err(UpdateError::Status(status));
    }
    let body = resp.text()?;
    latest_from_json(&body)
}

/// Plain string inequality; tags are not parsed as versions.
pub fn needs_upgrade(installed: &str, latest: &str) -> bool {
    installed != latest
}

/// Compares installed and published versions and upgrades on mismatch.
/// Never fails: every problem is logged and reported through the outcome.
pub fn check_for_update(
    host: &mut dyn Host,
    env: &Environment,
    installer: &Installer,
    fetch_latest: impl FnOnce() -> Result<String, UpdateError>,
) -> UpdateOutcome {
    let installed = match installed_version(host, env) {
        Ok(v) => v,
        Err(err) => {
            warn!("could not check {PACKAGE} version: {err}");
            return UpdateOutcome::Unavailable;
        }
    };
    info!("installed {PACKAGE} version: {installed}");

    let latest = match fetch_latest() {
        Ok(v) => v,
        Err(err) => {
            warn!("could not fetch latest {PACKAGE} release: {err}");
            return UpdateOutcome::Unavailable;
        }
    };
    info!("latest {PACKAGE} release: {latest}");

    if !needs_upgrade(&installed, &latest) {
        info!("{PACKAGE} is up to date");
        return UpdateOutcome::UpToDate;
    }

    let Some(mut upgrade) = installer::install_command(env, installer) else {
        warn!("{PACKAGE} {latest} is available but no package installer can upgrade it");
        return UpdateOutcome::NoInstaller;
    };
    upgrade.arg(PACKAGE);
    info!("upgrading {PACKAGE} {installed} -> {latest} with {installer}");
    match process::run_checked(host, &mut upgrade) {
        Ok(()) => UpdateOutcome::Upgraded {
            from: installed,
            to: latest,
        },
        Err(err) => {
            warn!("{PACKAGE} upgrade failed, continuing: {err}");
            UpdateOutcome::UpgradeFailed
        }
    }
}
