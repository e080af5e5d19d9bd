include!(concat!(env!("OUT_DIR"), "/launcher_config.rs"));

/// Run-time view of the build-time configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub entry_point: String,
    pub requirements: String,
    pub venv_dir: String,
    pub python: String,
    pub auto_update_enabled: bool,
}

impl Settings {
    pub fn from_build() -> Self {
        Self {
            entry_point: ENTRY_POINT.to_string(),
            requirements: REQUIREMENTS.to_string(),
            venv_dir: VENV_DIR.to_string(),
            python: PYTHON.to_string(),
            auto_update_enabled: AUTO_UPDATE_ENABLED,
        }
    }
}

pub fn user_agent() -> String {
    let product: String = NAME
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '.' { ch } else { '-' })
        .collect();
    format!("{product}-launcher/{VERSION}")
}
