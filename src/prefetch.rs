//! Build-time prefetch: pull all site content once, mirror its images and
//! write a manifest the page templates read instead of calling the CMS.
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use tracing::{info, instrument};

use crate::client::ContentSource;
use crate::config::RuntimeMode;
use crate::images::{ImageCache, PUBLIC_PREFIX};
use crate::model::{FetchResult, Homepage, MediaAsset, MenuItem, SingletonResult};

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImageStats {
    pub seen: usize,
    pub cached_locally: usize,
    pub unresolved: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteManifest {
    pub generated_at: DateTime<Utc>,
    pub mode: RuntimeMode,
    pub configured: bool,
    pub images: ImageStats,
    pub menu_items: FetchResult<MenuItem>,
    pub homepage: SingletonResult<Homepage>,
}

/// Fetch menu items and the homepage, then route every image URL through the cache.
///
/// Images are cached one at a time so same-named files are never written concurrently.
#[instrument(skip_all)]
pub async fn run(source: &dyn ContentSource, images: &ImageCache) -> SiteManifest {
    let (mut menu_items, mut homepage) = futures::join!(source.menu_items(), source.homepage());
    let mut stats = ImageStats::default();

    for item in &mut menu_items.items {
        if let Some(image) = item.image.as_mut() {
            localize(images, image, &mut stats).await;
        }
    }

    let hero_image = homepage
        .value
        .as_mut()
        .and_then(|home| home.hero_section.as_mut())
        .and_then(|hero| hero.hero_image.as_mut());
    if let Some(image) = hero_image {
        localize(images, image, &mut stats).await;
    }

    let settings = images.settings();
    info!(
        menu_items = menu_items.items.len(),
        homepage = homepage.value.is_some(),
        images_seen = stats.seen,
        images_local = stats.cached_locally,
        "prefetch complete"
    );

    SiteManifest {
        generated_at: Utc::now(),
        mode: settings.mode,
        configured: settings.is_configured(),
        images: stats,
        menu_items,
        homepage,
    }
}

async fn localize(images: &ImageCache, asset: &mut MediaAsset, stats: &mut ImageStats) {
    relink(images, &mut asset.url, stats).await;
    for format in asset.formats.values_mut() {
        relink(images, &mut format.url, stats).await;
    }
}

async fn relink(images: &ImageCache, url: &mut String, stats: &mut ImageStats) {
    stats.seen += 1;
    match images.cache_image(Some(url.as_str())).await {
        Some(resolved) => {
            if resolved.starts_with(PUBLIC_PREFIX) {
                stats.cached_locally += 1;
            }
            *url = resolved;
        }
        // Keep the raw path; the template decides how to render a missing image.
        None => stats.unresolved += 1,
    }
}

/// Write the manifest as pretty JSON, creating parent directories.
pub async fn write_manifest(path: &Path, manifest: &SiteManifest) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_vec_pretty(manifest).context("failed to serialize manifest")?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("failed to write manifest: {}", path.display()))?;
    Ok(())
}
