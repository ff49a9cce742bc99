use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One size variant of an uploaded image (`thumbnail`, `small`, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaFormat {
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub width: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub height: u32,
}

/// An image embedded in a content entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaAsset {
    #[serde(default)]
    pub id: Option<i64>,
    pub url: String,
    #[serde(rename = "alternativeText", default)]
    pub alt_text: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub width: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub height: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub formats: BTreeMap<String, MediaFormat>,
}

/// A relation expanded to its display field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RelatedEntity {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub document_id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: i64,
    #[serde(default)]
    pub document_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub image: Option<MediaAsset>,
    #[serde(default)]
    pub cuisine: Option<RelatedEntity>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HeroSection {
    #[serde(default)]
    pub id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub hero_image: Option<MediaAsset>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Homepage {
    pub id: i64,
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub hero_section: Option<HeroSection>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub page_count: u32,
    pub total: u64,
}

/// A page of collection entities. `items` is always present, possibly empty.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FetchResult<T> {
    pub items: Vec<T>,
    pub pagination: Option<Pagination>,
}

impl<T> FetchResult<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            pagination: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for FetchResult<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// A single document. `value` is `None` both for "no data" and "fetch failed".
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SingletonResult<T> {
    pub value: Option<T>,
    pub metadata: Map<String, Value>,
}

impl<T> SingletonResult<T> {
    pub fn empty() -> Self {
        Self {
            value: None,
            metadata: Map::new(),
        }
    }
}

impl<T> Default for SingletonResult<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Wire shape of a collection response: `{ "data": [...], "meta": { "pagination": ... } }`.
#[derive(Debug, Deserialize)]
pub(crate) struct CollectionEnvelope<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub meta: CollectionMeta,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CollectionMeta {
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

impl<T> From<CollectionEnvelope<T>> for FetchResult<T> {
    fn from(env: CollectionEnvelope<T>) -> Self {
        Self {
            items: env.data,
            pagination: env.meta.pagination,
        }
    }
}

/// Wire shape of a single-document response: `{ "data": {...} | null, "meta": {...} }`.
#[derive(Debug, Deserialize)]
pub(crate) struct SingletonEnvelope<T> {
    pub data: Option<T>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub meta: Map<String, Value>,
}

impl<T> From<SingletonEnvelope<T>> for SingletonResult<T> {
    fn from(env: SingletonEnvelope<T>) -> Self {
        Self {
            value: env.data,
            metadata: env.meta,
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
