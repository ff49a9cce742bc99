//! Resilient client for a headless CMS backing a static or server-rendered site.
//!
//! Every public fetch degrades to empty data instead of failing, and the image
//! cache always yields something displayable.
pub mod client;
pub mod config;
pub mod error;
pub mod images;
pub mod media;
pub mod model;
pub mod prefetch;

pub use client::{CmsClient, ContentSource};
pub use config::{RuntimeMode, Settings};
pub use error::FetchError;
pub use images::ImageCache;
pub use media::resolve_media_url;
pub use model::{FetchResult, Homepage, MediaAsset, MenuItem, SingletonResult};
