// Raw provider rows and canonical view models (DTOs)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One product as stored/fetched. Base-language fields are always present;
/// `*_en` variants exist only when a provider supplied them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawProductRow {
    pub id: i64,
    pub title: String,
    pub title_en: Option<String>,
    pub description: Option<String>,
    pub description_en: Option<String>,
    pub normalized_code: Option<String>,
    pub maker_code: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub duration_minutes: Option<i64>,
    pub default_thumbnail_url: Option<String>,
}

/// One provider's commercial listing for a product. `provider` is free-form
/// and only ever compared case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSourceRow {
    pub product_id: i64,
    pub provider: String,
    pub original_id: String,
    pub affiliate_url: String,
    pub price: Option<i64>,
    pub currency: Option<String>,
    pub product_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformerRow {
    pub id: i64,
    pub product_id: i64,
    pub name: String,
    pub name_kana: Option<String>,
    pub name_en: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagRow {
    pub id: i64,
    pub product_id: i64,
    pub name: String,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageRow {
    pub id: i64,
    pub product_id: i64,
    pub url: String,
    pub image_type: Option<String>,
    pub display_order: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoRow {
    pub id: i64,
    pub product_id: i64,
    pub url: String,
    pub video_type: Option<String>,
    pub display_order: i64,
}

/// Active discount for a product. Prices are integer minor units.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaleRow {
    pub product_id: i64,
    pub regular_price: Option<i64>,
    pub sale_price: Option<i64>,
    pub discount_percent: Option<i64>,
    pub sale_end_at: Option<DateTime<Utc>>,
}

/// Full performer profile row, used when mapping an actress page (as opposed
/// to the per-product `PerformerRow` credit).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPerformerRow {
    pub id: i64,
    pub name: String,
    pub name_kana: Option<String>,
    pub name_en: Option<String>,
    pub bio: Option<String>,
    pub bio_en: Option<String>,
    pub services: Option<Vec<String>>,
    pub aliases: Option<Vec<String>>,
}

/// Denormalized hot-path row: the price/link/thumbnail snapshot a caller may
/// have cached for a product. Takes precedence over the raw source row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductCache {
    pub price: Option<i64>,
    pub currency: Option<String>,
    pub affiliate_url: Option<String>,
    pub thumbnail_url: Option<String>,
}

/// Minimal performer credit on a canonical product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformerSummary {
    pub id: String,
    pub name: String,
}

/// One competing (non-primary) provider listing, ranked in feed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceOffer {
    pub provider: String,
    pub label: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
}

/// The single normalized product record this core produces, independent of
/// any one provider's raw shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalProduct {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maker_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affiliate_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,
    pub is_new: bool,
    pub is_future: bool,
    pub performers: Vec<PerformerSummary>,
    pub tags: Vec<String>,
    pub image_url: String,
    pub sample_images: Vec<String>,
    pub sample_videos: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regular_price: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<i64>,
    /// Always an ISO-8601 string when present, never a native date value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale_end_at: Option<String>,
    pub alternative_sources: Vec<SourceOffer>,
}

/// Canonical performer profile. `aliases`/`services` are omitted from the
/// serialized form entirely when absent; downstream treats "field present"
/// as "has entries to show".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalActress {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub thumbnail_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hero_image_url: Option<String>,
    pub release_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aliases: Option<Vec<String>>,
}
