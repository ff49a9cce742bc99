//! Build-time image mirroring into the site's static uploads directory.
use reqwest::{Client, Url};
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{info, instrument, warn};

use crate::config::{FileNaming, Settings};
use crate::error::FetchError;
use crate::media::resolve_media_url;

/// Site-relative prefix under which cached files are served.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Mirrors remote media into `Settings::uploads_dir` during production builds.
///
/// Downloads carry no timeout of their own. Files are overwritten in place;
/// two sources sharing a file name collide unless content-addressed naming is
/// enabled.
#[derive(Debug, Clone)]
pub struct ImageCache {
    http: Client,
    settings: Settings,
}

impl ImageCache {
    pub fn new(settings: Settings) -> Self {
        let http = Client::builder()
            .user_agent(concat!("cms-fallback/", env!("CARGO_PKG_VERSION")))
            .no_proxy()
            .build()
            .expect("reqwest client");
        Self::with_http(settings, http)
    }

    pub fn with_http(settings: Settings, http: Client) -> Self {
        Self { http, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Return a displayable URL for `path`, caching it locally in production.
    ///
    /// Never fails: on any error the absolute remote URL is returned instead.
    #[instrument(skip(self))]
    pub async fn cache_image(&self, path: Option<&str>) -> Option<String> {
        let path = path.map(str::trim).filter(|p| !p.is_empty())?;
        if !self.settings.mode.is_production() {
            return resolve_media_url(&self.settings, Some(path));
        }

        let Some(absolute) = resolve_media_url(&self.settings, Some(path)) else {
            warn!(path, "cannot resolve relative media path without a CMS base URL");
            return None;
        };

        match self.try_cache_image(&absolute).await {
            Ok(local) => Some(local),
            Err(err) => {
                match &err {
                    FetchError::MissingFileName(_) => {
                        warn!(url = %absolute, "no file name in media URL; using remote URL")
                    }
                    e if e.status().is_some() => warn!(
                        url = %absolute,
                        status = ?e.status(),
                        "image download {}; using remote URL",
                        e.notice()
                    ),
                    e => warn!(url = %absolute, error = ?e, "failed to cache image; using remote URL"),
                }
                Some(absolute)
            }
        }
    }

    /// Download `absolute_url` and store it, returning the site-relative path.
    pub async fn try_cache_image(&self, absolute_url: &str) -> Result<String, FetchError> {
        let file_name = file_name_for(absolute_url, self.settings.image_naming)?;

        let res = self
            .http
            .get(absolute_url)
            .send()
            .await
            .map_err(FetchError::Network)?;
        let status = res.status();
        if !status.is_success() {
            return Err(FetchError::from_status(status, absolute_url));
        }
        let bytes = res.bytes().await.map_err(FetchError::Network)?;

        tokio::fs::create_dir_all(&self.settings.uploads_dir).await?;
        let target = self.settings.uploads_dir.join(&file_name);
        tokio::fs::write(&target, &bytes).await?;
        info!(url = absolute_url, path = %target.display(), bytes = bytes.len(), "cached image");

        Ok(format!("{}/{}", PUBLIC_PREFIX, file_name))
    }
}

/// Local file name for a remote media URL.
pub fn file_name_for(absolute_url: &str, naming: FileNaming) -> Result<String, FetchError> {
    let url = Url::parse(absolute_url)
        .map_err(|e| FetchError::InvalidUrl(format!("{absolute_url}: {e}")))?;
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .ok_or_else(|| FetchError::MissingFileName(absolute_url.to_string()))?;

    match naming {
        FileNaming::SourceName => Ok(segment.to_string()),
        FileNaming::ContentAddressed => {
            let digest = Sha256::digest(url.as_str().as_bytes());
            let ext = Path::new(segment)
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| format!(".{}", e.to_ascii_lowercase()))
                .unwrap_or_default();
            Ok(format!("{}{}", hex::encode(digest), ext))
        }
    }
}
