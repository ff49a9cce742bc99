//! Media URL resolution.
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::Settings;

// Two or more characters, so a drive letter (`C:\...`) is not a scheme.
static SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]+:").expect("valid scheme regex"));

/// True when `path` already carries a scheme (`https://...`, `data:...`).
pub fn is_absolute_url(path: &str) -> bool {
    SCHEME.is_match(path)
}

/// Turn a possibly-relative media path into an absolute URL.
///
/// Absolute input is returned unchanged. Relative input needs a configured
/// base URL; without one there is nothing to resolve against and `None` is
/// returned. A blank path is treated like a missing one.
pub fn resolve_media_url(settings: &Settings, path: Option<&str>) -> Option<String> {
    let path = path.map(str::trim).filter(|p| !p.is_empty())?;
    if is_absolute_url(path) {
        return Some(path.to_string());
    }
    let base = settings.base_url()?;
    if path.starts_with('/') {
        Some(format!("{}{}", base, path))
    } else {
        Some(format!("{}/{}", base, path))
    }
}
