//! Application configuration.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

/// Directory under the platform config dir holding `config.toml`.
pub const CONFIG_DIR: &str = "nowplaying";
/// File name of the configuration file.
pub const CONFIG_FILE: &str = "config.toml";
/// Prefix for environment overrides, e.g. `NOWPLAYING_API_KEY`.
pub const ENV_PREFIX: &str = "NOWPLAYING";

/// Default catalog endpoint root.
pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
/// Default root for poster and backdrop URLs.
pub const DEFAULT_IMAGE_BASE_URL: &str = crate::models::IMAGE_BASE_URL;

const DEFAULT_CONFIG: &str = r#"# Now playing configuration.
# Every key may also be set through the environment, e.g. NOWPLAYING_API_KEY.

# Catalog API key (required).
api_key = ""

base_url = "https://api.themoviedb.org/3"
image_base_url = "https://image.tmdb.org/t/p/w500"

# Catalog page to show; only a single page is fetched.
page = 1

request_timeout_secs = 10
"#;

/// Settings shared by the catalog client, the poster loader and the UI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Static catalog API key sent with every request.
    pub api_key: String,
    /// Catalog endpoint root, without a trailing slash.
    pub base_url: String,
    /// Root prepended to poster and backdrop paths.
    pub image_base_url: String,
    /// Page requested at startup.
    pub page: u32,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
            page: 1,
            request_timeout_secs: 10,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location plus environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path()?)
    }

    /// Load configuration from `path` (which may be missing) plus environment overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let defaults = AppConfig::default();
        let settings = Config::builder()
            .set_default("api_key", defaults.api_key)?
            .set_default("base_url", defaults.base_url)?
            .set_default("image_base_url", defaults.image_base_url)?
            .set_default("page", defaults.page)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs)?
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .with_context(|| format!("failed to read config {}", path.display()))?;

        let config: AppConfig = settings
            .try_deserialize()
            .with_context(|| format!("invalid config {}", path.display()))?;
        config.validate()?;
        Ok(config.normalized())
    }

    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    fn validate(&self) -> Result<()> {
        if self.page < 1 {
            anyhow::bail!("page must be at least 1 (got {})", self.page);
        }
        if self.base_url.trim().is_empty() {
            anyhow::bail!("base_url must not be empty");
        }
        Ok(())
    }

    fn normalized(mut self) -> Self {
        self.api_key = self.api_key.trim().to_string();
        self.base_url = self.base_url.trim().trim_end_matches('/').to_string();
        self.image_base_url = self.image_base_url.trim().trim_end_matches('/').to_string();
        self
    }
}

/// Path of the configuration file under the platform config directory.
pub fn config_path() -> Result<PathBuf> {
    let dir = dirs::config_dir().context("unable to determine config directory")?;
    Ok(dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Write the commented default configuration if no file exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path()?;
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write default config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::{const_mutex, Mutex};
    use tempfile::tempdir;

    // Loading reads the process environment, so tests that load hold this.
    static ENV_LOCK: Mutex<()> = const_mutex(());

    #[test]
    fn default_template_matches_built_in_defaults() -> Result<()> {
        let _env = ENV_LOCK.lock();
        let dir = tempdir()?;
        let path = dir.path().join("nested").join(CONFIG_FILE);
        write_default_config(&path)?;
        assert!(path.exists());

        let config = AppConfig::load_from(&path)?;
        let defaults = AppConfig::default();
        assert_eq!(config.base_url, defaults.base_url);
        assert_eq!(config.image_base_url, defaults.image_base_url);
        assert_eq!(config.page, 1);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        Ok(())
    }

    #[test]
    fn existing_file_is_not_overwritten() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "page = 3\n")?;
        write_default_config(&path)?;
        assert_eq!(fs::read_to_string(&path)?, "page = 3\n");
        Ok(())
    }

    #[test]
    fn file_values_are_normalized() -> Result<()> {
        let _env = ENV_LOCK.lock();
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            r#"
api_key = "  abc123  "
base_url = "http://localhost:9000/3/"
image_base_url = "http://localhost:9000/img/"
page = 2
"#,
        )?;

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.api_key, "abc123");
        assert_eq!(config.base_url, "http://localhost:9000/3");
        assert_eq!(config.image_base_url, "http://localhost:9000/img");
        assert_eq!(config.page, 2);
        Ok(())
    }

    #[test]
    fn page_zero_is_rejected() -> Result<()> {
        let _env = ENV_LOCK.lock();
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "page = 0\n")?;
        assert!(AppConfig::load_from(&path).is_err());
        Ok(())
    }

    #[test]
    fn missing_file_falls_back_to_defaults() -> Result<()> {
        let _env = ENV_LOCK.lock();
        let dir = tempdir()?;
        let config = AppConfig::load_from(dir.path().join("absent.toml"))?;
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        Ok(())
    }

    #[test]
    fn environment_overrides_file_values() -> Result<()> {
        let _env = ENV_LOCK.lock();
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "api_key = \"file-key\"\npage = 2\n")?;

        std::env::set_var("NOWPLAYING_PAGE", "5");
        std::env::set_var("NOWPLAYING_API_KEY", "00012345678901234567890123456789");
        let loaded = AppConfig::load_from(&path);
        std::env::remove_var("NOWPLAYING_PAGE");
        std::env::remove_var("NOWPLAYING_API_KEY");

        let config = loaded?;
        assert_eq!(config.page, 5);
        assert_eq!(config.api_key, "00012345678901234567890123456789");
        Ok(())
    }
}
