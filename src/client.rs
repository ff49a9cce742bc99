use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use std::fmt;
use tracing::{debug, instrument, warn};

use crate::config::Settings;
use crate::error::FetchError;
use crate::model::{
    CollectionEnvelope, FetchResult, Homepage, MenuItem, SingletonEnvelope, SingletonResult,
};

pub const MENU_ITEMS_ENDPOINT: &str = "menu-items";
pub const HOMEPAGE_ENDPOINT: &str = "homepage";

/// Expansion for collections: the image with its variants and alt text, and the
/// cuisine relation by name.
pub const COLLECTION_POPULATE: &str =
    "populate[image][fields]=[url,alternativeText,formats]&populate[cuisine][fields]=[name]";

/// Expansion for the homepage: the hero section with its image.
pub const SINGLETON_POPULATE: &str = "populate[heroSection][populate]=heroImage";

/// Read-only client for the CMS content API.
///
/// The public `fetch_*` operations never fail: every error is logged and
/// replaced by empty data. The `try_*` variants expose the underlying error.
#[derive(Clone)]
pub struct CmsClient {
    http: Client,
    settings: Settings,
}

impl fmt::Debug for CmsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CmsClient")
            .field("base_url", &self.settings.base_url())
            .finish_non_exhaustive()
    }
}

/// Content the site needs at build or request time.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn menu_items(&self) -> FetchResult<MenuItem>;

    async fn homepage(&self) -> SingletonResult<Homepage>;
}

impl CmsClient {
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

    /// Build `GET {base}/api/{endpoint}?{query}` with the configured headers and timeout.
    pub fn build_request(&self, endpoint: &str, query: &str) -> Result<reqwest::Request, FetchError> {
        let base = self.settings.base_url().ok_or(FetchError::Unconfigured)?;
        let raw = format!("{}/api/{}", base, endpoint.trim_matches('/'));
        let mut url = Url::parse(&raw).map_err(|e| FetchError::InvalidUrl(format!("{raw}: {e}")))?;
        url.set_query(Some(query));

        let mut builder = self
            .http
            .get(url)
            .header(CONTENT_TYPE, "application/json")
            .timeout(self.settings.timeout);
        if let Some(token) = self.settings.credential() {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.build().map_err(FetchError::Network)
    }

    async fn execute_json<E: DeserializeOwned>(&self, request: reqwest::Request) -> Result<E, FetchError> {
        let url = request.url().to_string();
        let timeout = self.settings.timeout;
        debug!(url = %url, "requesting CMS content");

        let res = self
            .http
            .execute(request)
            .await
            .map_err(|e| FetchError::from_transport(e, timeout))?;

        let status = res.status();
        if !status.is_success() {
            return Err(FetchError::from_status(status, &url));
        }

        let body = res
            .bytes()
            .await
            .map_err(|e| FetchError::from_transport(e, timeout))?;
        debug!(url = %url, %status, bytes = body.len(), "CMS response received");
        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn try_fetch_collection<T: DeserializeOwned>(
        &self,
        endpoint: &str,
    ) -> Result<FetchResult<T>, FetchError> {
        let request = self.build_request(endpoint, COLLECTION_POPULATE)?;
        let envelope: CollectionEnvelope<T> = self.execute_json(request).await?;
        Ok(envelope.into())
    }

    pub async fn try_fetch_singleton<T: DeserializeOwned>(
        &self,
        endpoint: &str,
    ) -> Result<SingletonResult<T>, FetchError> {
        let request = self.build_request(endpoint, SINGLETON_POPULATE)?;
        let envelope: SingletonEnvelope<T> = self.execute_json(request).await?;
        Ok(envelope.into())
    }

    /// Fetch a collection; any failure yields `{ items: [], pagination: None }`.
    #[instrument(skip(self))]
    pub async fn fetch_collection<T: DeserializeOwned>(&self, endpoint: &str) -> FetchResult<T> {
        let result = self.try_fetch_collection(endpoint).await;
        self.or_fallback(endpoint, result)
    }

    /// Fetch a single document; any failure yields `{ value: None, metadata: {} }`.
    #[instrument(skip(self))]
    pub async fn fetch_singleton<T: DeserializeOwned>(&self, endpoint: &str) -> SingletonResult<T> {
        let result = self.try_fetch_singleton(endpoint).await;
        self.or_fallback(endpoint, result)
    }

    pub async fn fetch_menu_items(&self) -> FetchResult<MenuItem> {
        self.fetch_collection(MENU_ITEMS_ENDPOINT).await
    }

    pub async fn fetch_homepage(&self) -> SingletonResult<Homepage> {
        self.fetch_singleton(HOMEPAGE_ENDPOINT).await
    }

    fn or_fallback<T: Default>(&self, endpoint: &str, result: Result<T, FetchError>) -> T {
        match result {
            Ok(value) => value,
            Err(err) => {
                log_fallback(&self.settings, endpoint, &err);
                T::default()
            }
        }
    }
}

fn log_fallback(settings: &Settings, endpoint: &str, err: &FetchError) {
    match err {
        // Running without a backend is a supported mode, announced once at startup.
        FetchError::Unconfigured => debug!(endpoint, "CMS unconfigured; using fallback content"),
        _ if settings.debug => warn!(
            endpoint,
            notice = err.notice(),
            error = ?err,
            "CMS {}; using fallback content: {}",
            err.notice(),
            err
        ),
        _ => warn!(endpoint, "CMS {}; using fallback content", err.notice()),
    }
}

#[async_trait]
impl ContentSource for CmsClient {
    async fn menu_items(&self) -> FetchResult<MenuItem> {
        self.fetch_menu_items().await
    }

    async fn homepage(&self) -> SingletonResult<Homepage> {
        self.fetch_homepage().await
    }
}
