//! Batch aggregation: map N raw products with one prefetched relation bundle
//! in a single O(N) pass of map lookups — no per-product queries.
//!
//! Products are mutually independent: each canonical record depends only on
//! its own id's entries, so callers may shard or reorder the input freely.
//! The bundle is read-only for the duration of the call.

use std::collections::HashMap;

use itertools::Itertools;

use crate::mappers::{map_product, MapperDeps, ProductRelations};
use crate::model::{
    CanonicalProduct, ImageRow, PerformerRow, RawProductRow, RawSourceRow, SaleRow, SourceOffer,
    TagRow, VideoRow,
};
use crate::providers::{dti_direct_link, is_dti_provider, normalize_provider_key};

/// Prefetched relations for one page of products, keyed by product id. A key
/// absent from any map means "no relation" — the documented empty case, not
/// an error.
#[derive(Debug, Clone, Default)]
pub struct BatchRelatedData {
    pub performers_map: HashMap<i64, Vec<PerformerRow>>,
    pub tags_map: HashMap<i64, Vec<TagRow>>,
    pub images_map: HashMap<i64, Vec<ImageRow>>,
    pub videos_map: HashMap<i64, Vec<VideoRow>>,
    pub sales_map: HashMap<i64, Vec<SaleRow>>,
    /// The primary (selected) source per product.
    pub sources_map: HashMap<i64, RawSourceRow>,
    /// Every competing source per product, in feed order.
    pub all_sources_map: HashMap<i64, Vec<RawSourceRow>>,
}

impl BatchRelatedData {
    /// Group flat row lists by product id. The first source seen for a
    /// product becomes its primary; production callers that rank sources
    /// themselves should fill `sources_map` directly instead.
    pub fn from_rows(
        performers: Vec<PerformerRow>,
        tags: Vec<TagRow>,
        images: Vec<ImageRow>,
        videos: Vec<VideoRow>,
        sales: Vec<SaleRow>,
        sources: Vec<RawSourceRow>,
    ) -> Self {
        let mut batch = Self::default();
        for row in performers {
            batch.performers_map.entry(row.product_id).or_default().push(row);
        }
        for row in tags {
            batch.tags_map.entry(row.product_id).or_default().push(row);
        }
        for row in images {
            batch.images_map.entry(row.product_id).or_default().push(row);
        }
        for row in videos {
            batch.videos_map.entry(row.product_id).or_default().push(row);
        }
        for row in sales {
            batch.sales_map.entry(row.product_id).or_default().push(row);
        }
        for row in sources {
            batch
                .sources_map
                .entry(row.product_id)
                .or_insert_with(|| row.clone());
            batch.all_sources_map.entry(row.product_id).or_default().push(row);
        }
        batch
    }
}

fn slice_or_empty<T>(map: &HashMap<i64, Vec<T>>, id: i64) -> &[T] {
    map.get(&id).map(Vec::as_slice).unwrap_or(&[])
}

/// Ranked non-primary sources for one product:
/// 1. the source matching the primary provider (case-insensitive) is removed;
/// 2. the rest dedup by provider, first occurrence winning;
/// 3. DTI listings get the canonical redirect-domain link, everything else
///    passes its affiliate URL through verbatim;
/// 4. feed order is preserved minus the removals.
pub fn alternative_sources<D: MapperDeps>(
    all: &[RawSourceRow],
    primary: Option<&RawSourceRow>,
    deps: &D,
) -> Vec<SourceOffer> {
    let primary_key = primary.map(|p| normalize_provider_key(&p.provider));
    all.iter()
        .filter(|s| {
            primary_key
                .as_deref()
                .is_none_or(|pk| normalize_provider_key(&s.provider) != pk)
        })
        .unique_by(|s| normalize_provider_key(&s.provider))
        .map(|s| {
            let url = if is_dti_provider(&s.provider) {
                dti_direct_link(&s.original_id)
            } else {
                s.affiliate_url.clone()
            };
            SourceOffer {
                provider: deps.legacy_provider_id(&s.provider),
                label: deps.provider_label(&s.provider),
                url,
                price: s.price,
                currency: s.currency.clone(),
                product_type: s.product_type.clone(),
            }
        })
        .collect()
}

/// Map a page of products against one prefetched [`BatchRelatedData`].
/// Same resolution rules as the single-entity mapper, plus ranked
/// `alternative_sources`.
pub fn map_products_with_batch_data<D: MapperDeps>(
    products: &[RawProductRow],
    batch: &BatchRelatedData,
    deps: &D,
    locale: Option<&str>,
) -> Vec<CanonicalProduct> {
    let mapped: Vec<CanonicalProduct> = products
        .iter()
        .map(|product| {
            let primary = batch.sources_map.get(&product.id);
            let rels = ProductRelations {
                performers: slice_or_empty(&batch.performers_map, product.id),
                tags: slice_or_empty(&batch.tags_map, product.id),
                source: primary,
                cache: None,
                images: slice_or_empty(&batch.images_map, product.id),
                videos: slice_or_empty(&batch.videos_map, product.id),
                locale,
                sale: batch.sales_map.get(&product.id).and_then(|rows| rows.first()),
            };
            let mut canonical = map_product(product, deps, &rels);
            canonical.alternative_sources = alternative_sources(
                slice_or_empty(&batch.all_sources_map, product.id),
                primary,
                deps,
            );
            canonical
        })
        .collect();
    tracing::debug!(products = mapped.len(), "mapped product batch");
    mapped
}
