//! Configuration loader for the CMS client.
//!
//! Settings come from an optional YAML file and the process environment, with
//! environment variables taking precedence. The resolved [`Settings`] value is
//! immutable; binaries that want a single process-wide instance use [`global`].
//! A bad backend setting never stops a site build: [`load_or_unconfigured`]
//! and [`global`] fall back to unconfigured mode instead.
use once_cell::sync::OnceCell;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

pub const ENV_URL: &str = "CMS_URL";
pub const ENV_TOKEN: &str = "CMS_API_TOKEN";
pub const ENV_MODE: &str = "SITE_ENV";
pub const ENV_DEBUG: &str = "CMS_DEBUG";
pub const ENV_UPLOADS_DIR: &str = "CMS_UPLOADS_DIR";
pub const ENV_IMAGE_NAMING: &str = "CMS_IMAGE_NAMING";

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_UPLOADS_DIR: &str = "public/uploads";
pub const DEFAULT_CONFIG_FILE: &str = "cms.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Whether the site is being built for production or iterated on locally.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
    #[default]
    Development,
    Production,
}

impl RuntimeMode {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => RuntimeMode::Production,
            _ => RuntimeMode::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, RuntimeMode::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeMode::Development => "development",
            RuntimeMode::Production => "production",
        }
    }
}

/// How cached images are named inside the uploads directory.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum FileNaming {
    /// Final path segment of the source URL.
    #[default]
    #[serde(rename = "source")]
    SourceName,
    /// SHA-256 of the absolute source URL plus the original extension.
    #[serde(rename = "hash")]
    ContentAddressed,
}

impl FileNaming {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "source" => Some(FileNaming::SourceName),
            "hash" => Some(FileNaming::ContentAddressed),
            _ => None,
        }
    }
}

/// YAML file schema. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FileConfig {
    pub cms: CmsSection,
    pub site: SiteSection,
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CmsSection {
    pub url: Option<String>,
    pub token: Option<String>,
    pub timeout_seconds: u64,
    pub debug: bool,
}

impl Default for CmsSection {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            debug: false,
        }
    }
}

/// Site build settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SiteSection {
    pub mode: RuntimeMode,
    pub uploads_dir: String,
    pub image_naming: FileNaming,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            mode: RuntimeMode::Development,
            uploads_dir: DEFAULT_UPLOADS_DIR.to_string(),
            image_naming: FileNaming::SourceName,
        }
    }
}

/// Resolved, immutable client settings.
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    base_url: Option<String>,
    credential: Option<String>,
    pub mode: RuntimeMode,
    pub debug: bool,
    pub timeout: Duration,
    pub uploads_dir: PathBuf,
    pub image_naming: FileNaming,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("base_url", &self.base_url)
            .field("credential", &self.credential.as_ref().map(|_| "[REDACTED]"))
            .field("mode", &self.mode)
            .field("debug", &self.debug)
            .field("timeout", &self.timeout)
            .field("uploads_dir", &self.uploads_dir)
            .field("image_naming", &self.image_naming)
            .finish()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::unconfigured()
    }
}

impl Settings {
    /// Settings with no backend: every fetch short-circuits to fallback data.
    pub fn unconfigured() -> Self {
        Self {
            base_url: None,
            credential: None,
            mode: RuntimeMode::Development,
            debug: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            uploads_dir: PathBuf::from(DEFAULT_UPLOADS_DIR),
            image_naming: FileNaming::SourceName,
        }
    }

    /// Blank values are treated as absent; a trailing `/` on the base URL is dropped.
    pub fn new(base_url: Option<&str>, credential: Option<&str>) -> Self {
        Self {
            base_url: non_blank(base_url).map(|u| u.trim_end_matches('/').to_string()),
            credential: non_blank(credential).map(str::to_string),
            ..Self::unconfigured()
        }
    }

    pub fn with_mode(mut self, mode: RuntimeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_uploads_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.uploads_dir = dir.into();
        self
    }

    pub fn with_image_naming(mut self, naming: FileNaming) -> Self {
        self.image_naming = naming;
        self
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    /// Merge a parsed file with environment overrides provided by `lookup`.
    pub fn resolve<F>(file: FileConfig, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup(ENV_URL).or(file.cms.url);
        let token = lookup(ENV_TOKEN).or(file.cms.token);
        let mode = lookup(ENV_MODE)
            .map(|m| RuntimeMode::parse(&m))
            .unwrap_or(file.site.mode);
        let debug = lookup(ENV_DEBUG)
            .map(|d| is_truthy(&d))
            .unwrap_or(file.cms.debug);
        let uploads_dir = lookup(ENV_UPLOADS_DIR).unwrap_or(file.site.uploads_dir);
        let image_naming = match lookup(ENV_IMAGE_NAMING) {
            Some(raw) => FileNaming::parse(&raw)
                .ok_or(ConfigError::Invalid("CMS_IMAGE_NAMING must be `source` or `hash`"))?,
            None => file.site.image_naming,
        };

        if file.cms.timeout_seconds == 0 {
            return Err(ConfigError::Invalid("cms.timeout_seconds must be > 0"));
        }
        if uploads_dir.trim().is_empty() {
            return Err(ConfigError::Invalid("site.uploads_dir must be non-empty"));
        }

        let settings = Settings::new(url.as_deref(), token.as_deref())
            .with_mode(mode)
            .with_debug(debug)
            .with_timeout(Duration::from_secs(file.cms.timeout_seconds))
            .with_uploads_dir(uploads_dir.trim())
            .with_image_naming(image_naming);
        validate(&settings)?;
        Ok(settings)
    }

    /// Build settings from a key lookup alone (no file).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::resolve(FileConfig::default(), lookup)
    }

    /// Build settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// One-line startup notice about the backend state.
    pub fn announce(&self) {
        match self.base_url() {
            Some(url) => info!(
                base_url = url,
                authenticated = self.credential.is_some(),
                mode = self.mode.as_str(),
                "CMS backend configured"
            ),
            None => warn!(
                mode = self.mode.as_str(),
                "{} is not set; pages will render with fallback content", ENV_URL
            ),
        }
    }
}

/// Load configuration from an optional YAML file, then apply environment overrides.
/// - If `path` is None, `cms.yaml` in the working directory is used when present.
pub fn load(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let file = match path {
        Some(p) => parse_file(p)?,
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if default.exists() {
                parse_file(default)?
            } else {
                FileConfig::default()
            }
        }
    };
    Settings::resolve(file, |key| std::env::var(key).ok())
}

/// Like [`load`], but invalid settings degrade to unconfigured mode with a warning.
///
/// Only an explicitly named file that cannot be read or parsed is an error; a
/// broken default `cms.yaml` is skipped.
pub fn load_or_unconfigured(path: Option<&Path>) -> Result<Settings, ConfigError> {
    load_or_unconfigured_with(path, |key| std::env::var(key).ok())
}

fn load_or_unconfigured_with<F>(path: Option<&Path>, lookup: F) -> Result<Settings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let file = match path {
        Some(p) => parse_file(p)?,
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if default.exists() {
                parse_file(default).unwrap_or_else(|err| {
                    warn!(%err, path = %default.display(), "ignoring unreadable config file");
                    FileConfig::default()
                })
            } else {
                FileConfig::default()
            }
        }
    };
    let mode = lookup(ENV_MODE)
        .map(|m| RuntimeMode::parse(&m))
        .unwrap_or(file.site.mode);

    Ok(Settings::resolve(file, lookup).unwrap_or_else(|err| {
        warn!(%err, "invalid CMS configuration; continuing unconfigured");
        Settings::unconfigured().with_mode(mode)
    }))
}

fn parse_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

static GLOBAL: OnceCell<Settings> = OnceCell::new();

/// Process-wide settings from `cms.yaml` and the environment, resolved on first use.
///
/// Invalid configuration degrades to unconfigured mode instead of failing.
pub fn global() -> &'static Settings {
    GLOBAL.get_or_init(|| {
        let settings = load_or_unconfigured(None).unwrap_or_else(|err| {
            warn!(%err, "invalid CMS configuration; continuing unconfigured");
            Settings::unconfigured()
        });
        settings.announce();
        settings
    })
}

fn validate(settings: &Settings) -> Result<(), ConfigError> {
    if let Some(url) = settings.base_url() {
        let parsed = Url::parse(url)
            .map_err(|_| ConfigError::Invalid("CMS base URL must be an absolute URL"))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ConfigError::Invalid("CMS base URL must use http or https"));
        }
        if parsed.query().is_some() {
            return Err(ConfigError::Invalid("CMS base URL must not carry a query string"));
        }
    }
    Ok(())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn is_truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Example YAML configuration.
pub fn example() -> &'static str {
    r#"cms:
  url: "https://cms.example.com"
  token: "YOUR_CMS_API_TOKEN"
  timeout_seconds: 10
  debug: false

site:
  mode: production
  uploads_dir: "public/uploads"
  image_naming: source
"#
}
