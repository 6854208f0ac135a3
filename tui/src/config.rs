//! Overlay settings: a TOML file, overridden by command-line flags.

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::cli::Cli;
use crate::error::ConfigError;
use crate::history_pane::HistoryOptions;
use crate::style::Theme;
use crate::style::ThemeName;

const CONFIG_DIR_NAME: &str = ".history-split";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub tools_expanded: bool,
    pub hide_thinking: bool,
    /// Turn on mouse reporting so the wheel scrolls the history.
    pub mouse: bool,
    pub theme: ThemeName,
    pub cwd: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            tools_expanded: false,
            hide_thinking: false,
            mouse: true,
            theme: ThemeName::default(),
            cwd: None,
            log_dir: None,
        }
    }
}

/// `~/.history-split`, if a home directory can be found.
pub fn config_home() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME))
}

impl OverlayConfig {
    /// Load `explicit` if given, else the default config file if it exists, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match config_home().map(|dir| dir.join(CONFIG_FILE_NAME)) {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Flags win over the file; boolean flags can only switch features on (or mouse off).
    pub fn apply_cli(&mut self, cli: &Cli) {
        self.tools_expanded |= cli.expand_tools;
        self.hide_thinking |= cli.hide_thinking;
        if cli.no_mouse {
            self.mouse = false;
        }
        if let Some(theme) = cli.theme {
            self.theme = theme;
        }
        if let Some(cwd) = &cli.cwd {
            self.cwd = Some(cwd.clone());
        }
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir
            .clone()
            .or_else(|| config_home().map(|dir| dir.join("log")))
            .unwrap_or_else(|| std::env::temp_dir().join("history-split"))
    }

    pub fn history_options(&self) -> HistoryOptions {
        HistoryOptions {
            theme: Theme::named(self.theme),
            tools_expanded: self.tools_expanded,
            hide_thinking: self.hide_thinking,
            cwd: self.cwd.clone().or_else(|| std::env::current_dir().ok()),
        }
    }
}
