//! Entity mappers: pure functions merging one raw product/performer with its
//! resolved relations into the canonical view models.
//!
//! Locale resolution, provider labels, legacy provider ids and the evaluation
//! clock are all injected through [`MapperDeps`] so the mapper itself carries
//! no hardcoded language or provider-label strings and stays deterministic
//! under test.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::media::{full_size_image_url, normalize_image_url};
use crate::model::{
    CanonicalActress, CanonicalProduct, ImageRow, PerformerRow, PerformerSummary, ProductCache,
    RawPerformerRow, RawProductRow, RawSourceRow, SaleRow, TagRow, VideoRow,
};
use crate::providers::normalize_provider_key;

/// Caller-supplied resolution bundle. Every method has a base-language /
/// identity default, so `BaseDeps` works out of the box and hosts override
/// only what they localize.
pub trait MapperDeps {
    fn localized_title(&self, product: &RawProductRow, _locale: Option<&str>) -> String {
        product.title.clone()
    }

    fn localized_description(
        &self,
        product: &RawProductRow,
        _locale: Option<&str>,
    ) -> Option<String> {
        product.description.clone()
    }

    fn performer_name(&self, performer: &PerformerRow, _locale: Option<&str>) -> String {
        performer.name.clone()
    }

    fn actress_name(&self, performer: &RawPerformerRow, _locale: Option<&str>) -> String {
        performer.name.clone()
    }

    fn actress_bio(&self, performer: &RawPerformerRow, _locale: Option<&str>) -> Option<String> {
        performer.bio.clone()
    }

    /// Human-readable provider label. The default echoes the normalized key;
    /// hosts inject their display names.
    fn provider_label(&self, provider: &str) -> String {
        normalize_provider_key(provider)
    }

    /// Map a legacy free-form provider name to its canonical id.
    fn legacy_provider_id(&self, provider: &str) -> String {
        normalize_provider_key(provider)
    }

    /// Evaluation time for the `is_new`/`is_future` flags. Override in tests
    /// for determinism.
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Zero-configuration deps: base-language fields, identity provider mapping,
/// wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseDeps;

impl MapperDeps for BaseDeps {}

/// Resolved relations for one product. All fields default to absent; the
/// mapper treats a missing relation as "nothing to merge", never an error.
#[derive(Default)]
pub struct ProductRelations<'a> {
    pub performers: &'a [PerformerRow],
    pub tags: &'a [TagRow],
    pub source: Option<&'a RawSourceRow>,
    pub cache: Option<&'a ProductCache>,
    pub images: &'a [ImageRow],
    pub videos: &'a [VideoRow],
    pub locale: Option<&'a str>,
    pub sale: Option<&'a SaleRow>,
}

// Tokens the crawlers are known to emit in place of a real performer name.
const GARBAGE_NAME_TOKENS: &[&str] = &["---", "n/a", "ほか", "他数名"];

/// Performer-name validity filter applied in both the single-entity and the
/// batch path: drops empty and single-character names, composite credits
/// joined with the `・` separator, and known parser-garbage tokens.
pub fn is_valid_performer_name(name: &str) -> bool {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.chars().count() <= 1 {
        return false;
    }
    if trimmed.contains('・') {
        return false;
    }
    let lowered = trimmed.to_lowercase();
    !GARBAGE_NAME_TOKENS.iter().any(|tok| lowered == *tok)
}

/// Release date within the trailing 7 days, inclusive of today.
pub fn is_new(release_date: NaiveDate, now: DateTime<Utc>) -> bool {
    let today = now.date_naive();
    release_date <= today && release_date >= today - Duration::days(7)
}

/// Release date strictly after today. Mutually exclusive with [`is_new`] by
/// construction.
pub fn is_future(release_date: NaiveDate, now: DateTime<Utc>) -> bool {
    release_date > now.date_naive()
}

fn resolve_performers<D: MapperDeps>(
    performers: &[PerformerRow],
    deps: &D,
    locale: Option<&str>,
) -> Vec<PerformerSummary> {
    performers
        .iter()
        .filter_map(|p| {
            let name = deps.performer_name(p, locale);
            if !is_valid_performer_name(&name) {
                tracing::debug!(performer_id = p.id, name = %name, "filtered invalid performer name");
                return None;
            }
            Some(PerformerSummary {
                id: p.id.to_string(),
                name: name.trim().to_string(),
            })
        })
        .collect()
}

/// Primary-image candidate chain: product thumbnail, cached thumbnail, the
/// first explicit `"thumbnail"` image, then any image at all.
fn primary_image_url(
    product: &RawProductRow,
    cache: Option<&ProductCache>,
    images: &[ImageRow],
) -> String {
    let candidate = product
        .default_thumbnail_url
        .as_deref()
        .filter(|u| !u.trim().is_empty())
        .or_else(|| {
            cache
                .and_then(|c| c.thumbnail_url.as_deref())
                .filter(|u| !u.trim().is_empty())
        })
        .or_else(|| {
            images
                .iter()
                .find(|img| {
                    img.image_type
                        .as_deref()
                        .is_some_and(|t| t.eq_ignore_ascii_case("thumbnail"))
                })
                .map(|img| img.url.as_str())
        })
        .or_else(|| images.first().map(|img| img.url.as_str()));
    normalize_image_url(candidate)
}

fn ordered_media_urls<'a>(urls: impl Iterator<Item = (i64, &'a str)>) -> Vec<String> {
    let mut entries: Vec<(i64, &str)> = urls.collect();
    entries.sort_by_key(|(order, _)| *order);
    entries
        .into_iter()
        .map(|(_, url)| full_size_image_url(&normalize_image_url(Some(url))))
        .collect()
}

/// Merge one raw product with its resolved relations into the canonical
/// record. Deterministic given `deps`; the input rows are never mutated.
pub fn map_product<D: MapperDeps>(
    product: &RawProductRow,
    deps: &D,
    rels: &ProductRelations<'_>,
) -> CanonicalProduct {
    let locale = rels.locale;
    let now = deps.now();

    let price = rels
        .cache
        .and_then(|c| c.price)
        .or_else(|| rels.source.and_then(|s| s.price));
    let currency = rels
        .cache
        .and_then(|c| c.currency.clone())
        .or_else(|| rels.source.and_then(|s| s.currency.clone()));
    let affiliate_url = rels
        .cache
        .and_then(|c| c.affiliate_url.clone())
        .or_else(|| rels.source.map(|s| s.affiliate_url.clone()));

    let sale = rels.sale;
    let discount = sale.and_then(|s| {
        s.discount_percent.or_else(|| match (s.regular_price, s.sale_price) {
            (Some(reg), Some(sp)) if reg > 0 && sp < reg => Some((reg - sp) * 100 / reg),
            _ => None,
        })
    });

    CanonicalProduct {
        id: product.id.to_string(),
        title: deps.localized_title(product, locale),
        description: deps.localized_description(product, locale),
        normalized_code: product.normalized_code.clone(),
        maker_code: product.maker_code.clone(),
        price,
        currency,
        provider: rels.source.map(|s| deps.legacy_provider_id(&s.provider)),
        provider_label: rels.source.map(|s| deps.provider_label(&s.provider)),
        affiliate_url,
        duration_minutes: product.duration_minutes,
        release_date: product.release_date,
        is_new: product
            .release_date
            .is_some_and(|d| is_new(d, now)),
        is_future: product
            .release_date
            .is_some_and(|d| is_future(d, now)),
        performers: resolve_performers(rels.performers, deps, locale),
        tags: rels
            .tags
            .iter()
            .map(|t| t.name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect(),
        image_url: primary_image_url(product, rels.cache, rels.images),
        sample_images: ordered_media_urls(
            rels.images
                .iter()
                .map(|img| (img.display_order, img.url.as_str())),
        ),
        sample_videos: ordered_media_urls(
            rels.videos
                .iter()
                .map(|vid| (vid.display_order, vid.url.as_str())),
        ),
        regular_price: sale.and_then(|s| s.regular_price),
        sale_price: sale.and_then(|s| s.sale_price),
        discount,
        sale_end_at: sale.and_then(|s| s.sale_end_at).map(|dt| dt.to_rfc3339()),
        alternative_sources: Vec::new(),
    }
}

/// Presentation options for the actress mapper.
#[derive(Default)]
pub struct ActressOptions<'a> {
    pub thumbnail_url: Option<&'a str>,
    pub hero_image_url: Option<&'a str>,
    pub locale: Option<&'a str>,
}

fn non_empty_list(list: Option<&Vec<String>>) -> Option<Vec<String>> {
    let cleaned: Vec<String> = list?
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Map one performer profile into the canonical actress record.
///
/// `aliases` is omitted entirely — not set to an empty vec — when the input
/// alias list is empty; downstream consumers treat field presence as "has
/// aliases to show". The service list maps case-insensitively to normalized
/// provider ids.
pub fn map_performer_to_actress<D: MapperDeps>(
    performer: &RawPerformerRow,
    release_count: i64,
    deps: &D,
    options: &ActressOptions<'_>,
) -> CanonicalActress {
    let services = non_empty_list(performer.services.as_ref()).map(|list| {
        list.iter()
            .map(|s| normalize_provider_key(s))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
    });
    // A service list that normalized away entirely is absent, same as aliases.
    let services = services.filter(|list| !list.is_empty());

    CanonicalActress {
        id: performer.id.to_string(),
        name: deps.actress_name(performer, options.locale),
        bio: deps.actress_bio(performer, options.locale),
        thumbnail_url: normalize_image_url(options.thumbnail_url),
        hero_image_url: options
            .hero_image_url
            .map(|u| normalize_image_url(Some(u))),
        release_count,
        services,
        aliases: non_empty_list(performer.aliases.as_ref()),
    }
}
