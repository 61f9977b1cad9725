//! Settings for the command line. Values are layered: defaults, then the TOML
//! file (`config/bilancio.toml` unless `--config` says otherwise), then
//! `BILANCIO_*` environment variables, then command line flags.
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::Result;

const DEFAULT_CONFIG_PATH: &str = "config/bilancio.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Backing sheet.
    pub file: PathBuf,
    /// Backups kept next to the sheet.
    pub retention: usize,
    /// Log level for the `tracing` filter.
    pub level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            file: PathBuf::from("Master_Sheet_Expenses.csv"),
            retention: engine::DEFAULT_RETENTION,
            level: "info".to_string(),
        }
    }
}

/// Values given on the command line, which win over everything else.
#[derive(Debug, Default)]
pub struct Overrides {
    pub config: Option<String>,
    pub file: Option<PathBuf>,
    pub retention: Option<usize>,
    pub level: Option<String>,
}

pub fn load(overrides: Overrides) -> Result<Settings> {
    let config_path = overrides.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("BILANCIO").try_parsing(true));
    let mut settings: Settings = builder.build()?.try_deserialize()?;

    if let Some(file) = overrides.file {
        settings.file = file;
    }
    if let Some(retention) = overrides.retention {
        settings.retention = retention;
    }
    if let Some(level) = overrides.level {
        settings.level = level;
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn file_values_are_read_and_flags_win() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bilancio.toml");
        fs::write(&path, "file = \"home.csv\"\nretention = 3\n").unwrap();

        let settings = load(Overrides {
            config: Some(path.to_string_lossy().into_owned()),
            level: Some("debug".to_string()),
            ..Overrides::default()
        })
        .unwrap();

        assert_eq!(settings.file, PathBuf::from("home.csv"));
        assert_eq!(settings.retention, 3);
        assert_eq!(settings.level, "debug");
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = load(Overrides {
            config: Some(dir.path().join("absent.toml").to_string_lossy().into_owned()),
            file: Some(PathBuf::from("other.csv")),
            ..Overrides::default()
        })
        .unwrap();

        assert_eq!(settings.file, PathBuf::from("other.csv"));
        assert_eq!(settings.retention, engine::DEFAULT_RETENTION);
    }
}
