use crate::error::AppError;
use crate::journal::{JOURNAL_DIR_ENV_VAR, JournalConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "TASKBOARD_CONFIG_PATH";

const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[38;5;250m";

/// Terminal colouring for `list`, `completed` and `watch` output.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Plain,
    Noir,
    Solarized,
}

impl Theme {
    /// Case and separator insensitive. Unknown names give `None`.
    pub fn parse(raw: &str) -> Option<Theme> {
        let key: String = raw
            .chars()
            .filter(|ch| ch.is_ascii_alphanumeric())
            .map(|ch| ch.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "" | "plain" | "default" | "light" | "none" => Some(Theme::Plain),
            "noir" | "dark" | "darkmode" => Some(Theme::Noir),
            "solarized" => Some(Theme::Solarized),
            _ => None,
        }
    }

    pub fn from_config(config: &Config) -> Theme {
        config
            .theme
            .as_deref()
            .and_then(Theme::parse)
            .unwrap_or_default()
    }

    pub fn name(self) -> &'static str {
        match self {
            Theme::Plain => "plain",
            Theme::Noir => "noir",
            Theme::Solarized => "solarized",
        }
    }

    fn accent(self) -> Option<&'static str> {
        match self {
            Theme::Plain => None,
            Theme::Noir => Some("\x1b[38;5;208m"),
            Theme::Solarized => Some("\x1b[38;5;108m"),
        }
    }

    /// Task titles and running clocks.
    pub fn highlight(self, text: &str) -> String {
        match self.accent() {
            Some(code) => format!("{code}{text}{RESET}"),
            None => text.to_string(),
        }
    }

    /// Empty-list placeholders.
    pub fn dim(self, text: &str) -> String {
        match self {
            Theme::Plain => text.to_string(),
            _ => format!("{DIM}{text}{RESET}"),
        }
    }
}

fn normalize_theme(raw: &str) -> Option<String> {
    match Theme::parse(raw) {
        Some(theme) => Some(theme.name().to_string()),
        None => {
            tracing::warn!(theme = raw, "unknown theme, using plain output");
            None
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub journal: JournalConfig,
    #[serde(default)]
    pub desktop_notices: bool,
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub theme: Option<String>,
    pub journal_dir: Option<PathBuf>,
    pub journal_folder: Option<String>,
    pub journal_format: Option<String>,
    pub journal_enabled: Option<bool>,
    pub desktop_notices: Option<bool>,
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata)
            .join("taskboard")
            .join(CONFIG_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("taskboard")
            .join(CONFIG_FILE_NAME))
    }
}

/// Loads the config file, falling back to defaults, then applies
/// `TASKBOARD_JOURNAL_DIR`.
pub fn load_config_with_fallback() -> ConfigLoad {
    let mut load = match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    };

    if let Ok(dir) = std::env::var(JOURNAL_DIR_ENV_VAR)
        && !dir.trim().is_empty()
    {
        load.config.journal.dir = Some(PathBuf::from(dir));
    }

    load
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    let mut config: Config = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })?;
    config.theme = config.theme.and_then(|name| normalize_theme(&name));
    Ok(config)
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    if let Some(normalized) = overrides.theme.as_deref().and_then(normalize_theme) {
        merged.theme = Some(normalized);
    }
    if let Some(dir) = overrides.journal_dir.as_ref() {
        merged.journal.dir = Some(dir.clone());
    }
    if let Some(folder) = overrides.journal_folder.as_ref() {
        merged.journal.folder = folder.clone();
    }
    if let Some(format) = overrides.journal_format.as_ref() {
        merged.journal.format = format.clone();
    }
    if let Some(enabled) = overrides.journal_enabled {
        merged.journal.enabled = enabled;
    }
    if let Some(desktop_notices) = overrides.desktop_notices {
        merged.desktop_notices = desktop_notices;
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::{
        Config, ConfigOverrides, Theme, load_config_from_path, load_config_with_fallback_from_path,
        merge_overrides,
    };
    use crate::journal::JournalConfig;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("taskboard-{nanos}-{file_name}"))
    }

    #[test]
    fn load_config_missing_returns_defaults_without_error() {
        let path = temp_path("missing-config.json");
        let result = load_config_with_fallback_from_path(&path);

        assert_eq!(result.config, Config::default());
        assert!(result.error.is_none());
    }

    #[test]
    fn load_config_invalid_returns_defaults_and_error() {
        let path = temp_path("invalid-config.json");
        fs::write(&path, "{ invalid json ").unwrap();

        let result = load_config_with_fallback_from_path(&path);
        fs::remove_file(&path).ok();

        assert_eq!(result.config, Config::default());
        assert_eq!(result.error.unwrap().code(), "invalid_data");
    }

    #[test]
    fn load_config_reads_valid_file() {
        let path = temp_path("valid-config.json");
        let content = serde_json::json!({
            "theme": "Dark Mode",
            "journal": {
                "folder": "Daily",
                "format": "DD-MM-YYYY"
            },
            "desktop_notices": true
        });
        fs::write(&path, serde_json::to_string(&content).unwrap()).unwrap();

        let loaded = load_config_from_path(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded.theme.as_deref(), Some("noir"));
        assert_eq!(loaded.journal.folder, "Daily");
        assert_eq!(loaded.journal.format, "DD-MM-YYYY");
        assert!(loaded.journal.enabled);
        assert!(loaded.desktop_notices);
    }

    #[test]
    fn merge_overrides_updates_journal_and_theme() {
        let base = Config {
            theme: Some("plain".into()),
            journal: JournalConfig::default(),
            desktop_notices: true,
        };
        let overrides = ConfigOverrides {
            theme: Some("solarized".into()),
            journal_dir: Some(PathBuf::from("/vault")),
            journal_enabled: Some(false),
            desktop_notices: Some(false),
            ..ConfigOverrides::default()
        };

        let merged = merge_overrides(&base, &overrides);

        assert_eq!(merged.theme.as_deref(), Some("solarized"));
        assert_eq!(merged.journal.dir, Some(PathBuf::from("/vault")));
        assert_eq!(merged.journal.folder, "日记");
        assert!(!merged.journal.enabled);
        assert!(!merged.desktop_notices);
        assert_eq!(base.theme.as_deref(), Some("plain"));
    }

    #[test]
    fn merge_overrides_with_empty_overrides_returns_clone() {
        let base = Config {
            theme: Some("noir".into()),
            ..Config::default()
        };

        assert_eq!(merge_overrides(&base, &ConfigOverrides::default()), base);
    }

    #[test]
    fn theme_parse_accepts_aliases_and_rejects_unknown() {
        assert_eq!(Theme::parse("Dark Mode"), Some(Theme::Noir));
        assert_eq!(Theme::parse("light"), Some(Theme::Plain));
        assert_eq!(Theme::parse("  "), Some(Theme::Plain));
        assert_eq!(Theme::parse("SOLARIZED"), Some(Theme::Solarized));
        assert_eq!(Theme::parse("neon"), None);
    }

    #[test]
    fn unknown_theme_override_keeps_base_theme() {
        let base = Config {
            theme: Some("noir".into()),
            ..Config::default()
        };
        let overrides = ConfigOverrides {
            theme: Some("neon".into()),
            ..ConfigOverrides::default()
        };

        let merged = merge_overrides(&base, &overrides);

        assert_eq!(merged.theme.as_deref(), Some("noir"));
        assert_eq!(Theme::from_config(&merged), Theme::Noir);
    }

    #[test]
    fn theme_colours_only_when_not_plain() {
        assert_eq!(Theme::Plain.highlight("x"), "x");
        assert_eq!(Theme::Plain.dim("x"), "x");
        assert_eq!(Theme::Noir.highlight("x"), "\x1b[38;5;208mx\x1b[0m");
        assert_eq!(Theme::Solarized.dim("x"), "\x1b[38;5;250mx\x1b[0m");
        assert_eq!(Theme::from_config(&Config::default()), Theme::Plain);
    }
}
