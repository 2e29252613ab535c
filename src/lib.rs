//! Normalization and aggregation core for multi-provider catalog data.
//!
//! Raw product/performer rows collected from unrelated third-party catalogs
//! arrive in whatever shape each provider emits — numbers as strings,
//! snake_case or camelCase keys, HTML fragments in URL columns. This crate
//! validates those rows ([`rows`]), repairs media links ([`media`]), and
//! merges everything into canonical view models ([`mappers`], [`batch`])
//! suitable for display, ranking and search.
//!
//! Design constraints, enforced throughout:
//! 1. Pure and synchronous — no I/O, no shared mutable state. Storage and
//!    crawlers live elsewhere; this core consumes already-fetched rows.
//! 2. Upstream noise never raises. Malformed rows are dropped, malformed
//!    payloads degrade to empty collections, unresolvable media becomes a
//!    placeholder.
//! 3. Locale, provider labels, and the evaluation clock are injected
//!    ([`mappers::MapperDeps`]); the core hardcodes no language strings.

pub mod batch;
pub mod logging;
pub mod mappers;
pub mod media;
pub mod model;
pub mod providers;
pub mod rows;

pub use batch::{map_products_with_batch_data, BatchRelatedData};
pub use mappers::{map_performer_to_actress, map_product, BaseDeps, MapperDeps};
pub use media::{full_size_image_url, normalize_image_url, PLACEHOLDER_IMAGE};
pub use model::{CanonicalActress, CanonicalProduct};
