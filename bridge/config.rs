use crate::error::App;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = ".config/rune-bridge";

/// Well-known locations under `$HOME/.config/rune-bridge`.
#[derive(Debug, Clone)]
pub struct Paths {
    pub root: PathBuf,
}

impl Paths {
    pub fn from_env() -> Result<Self, App> {
        let home_dir = std::env::var("HOME")?;
        Ok(Self::under(Path::new(&home_dir)))
    }

    pub fn under(home_dir: &Path) -> Self {
        Self {
            root: home_dir.join(APP_DIR),
        }
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn default_library(&self) -> PathBuf {
        self.root.join("library.toml")
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
struct RawConfig {
    log_level: Option<String>,
    library: Option<PathBuf>,
    request_timeout_secs: Option<u64>,
    channel_capacity: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub log_level: String,
    pub library: PathBuf,
    /// `None` waits for answers forever.
    pub request_timeout: Option<Duration>,
    pub channel_capacity: usize,
}

impl Config {
    pub fn parse(content: &str, paths: &Paths) -> Result<Self, App> {
        let raw: RawConfig = toml::from_str(content)?;
        let channel_capacity = raw.channel_capacity.unwrap_or(64);
        if channel_capacity == 0 {
            return Err(App::InvalidInput(
                "channel_capacity must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            log_level: raw.log_level.unwrap_or_else(|| "info".to_string()),
            library: raw.library.unwrap_or_else(|| paths.default_library()),
            request_timeout: match raw.request_timeout_secs.unwrap_or(5) {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            channel_capacity,
        })
    }

    /// Reads the config file, falling back to defaults when it doesn't exist.
    pub async fn load(paths: &Paths) -> Result<Self, App> {
        let file = paths.config_file();
        if !tokio::fs::try_exists(&file).await? {
            return Self::parse("", paths);
        }
        let content = tokio::fs::read_to_string(&file).await?;
        Self::parse(&content, paths)
    }
}
