use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Overrides the launcher root, mainly for development.
pub const ROOT_ENV: &str = "YTDLP_GUI_ROOT";

pub fn self_path() -> Result<PathBuf> {
    std::env::current_exe().context("current_exe")
}

/// Absolute launcher root; a relative override resolves against the current dir.
pub fn root_dir() -> Result<PathBuf> {
    if let Some(dev_root) = std::env::var_os(ROOT_ENV) {
        if !dev_root.is_empty() {
            let dev_root = PathBuf::from(dev_root);
            return std::path::absolute(&dev_root)
                .with_context(|| format!("resolve {ROOT_ENV}={}", dev_root.display()));
        }
    }
    let exe = self_path()?;
    Ok(exe.parent().context("exe has no parent")?.to_path_buf())
}

/// Makes `root` the working directory so relative paths in config.toml resolve there.
pub fn enter_root(root: &Path) -> Result<()> {
    std::env::set_current_dir(root).with_context(|| format!("enter {}", root.display()))
}
