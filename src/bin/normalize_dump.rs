//! Normalize a raw catalog dump into canonical product JSON.
//!
//! Input is a single JSON object whose members are row lists in either
//! query-result shape (bare array or `{rows: [...]}`):
//! `products`, `performers`, `tags`, `images`, `videos`, `sales`, `sources`.
//! Useful for eyeballing what the reconciliation core makes of a crawler
//! dump without standing up the rest of the stack.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;

use catalog_reconcile::batch::{map_products_with_batch_data, BatchRelatedData};
use catalog_reconcile::logging::init_tracing;
use catalog_reconcile::mappers::BaseDeps;
use catalog_reconcile::rows;

#[derive(Parser, Debug)]
#[command(about = "Normalize a raw catalog dump into canonical product JSON")]
struct Args {
    /// Path to the raw dump (JSON object with row-list members)
    input: PathBuf,

    /// Locale passed to the mappers (base language when omitted)
    #[arg(long)]
    locale: Option<String>,

    /// Only map the first N products
    #[arg(long)]
    limit: Option<usize>,

    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    init_tracing("info")?;
    let args = Args::parse();

    let raw = std::fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let dump: Value = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {}", args.input.display()))?;

    let member = |key: &str| dump.get(key).cloned().unwrap_or(Value::Null);

    let mut products = rows::to_product_rows(&member("products"));
    if let Some(limit) = args.limit {
        products.truncate(limit);
    }

    let batch = BatchRelatedData::from_rows(
        rows::to_performer_rows(&member("performers")),
        rows::to_tag_rows(&member("tags")),
        rows::to_image_rows(&member("images")),
        rows::to_video_rows(&member("videos")),
        rows::to_sale_rows(&member("sales")),
        rows::to_source_rows(&member("sources")),
    );

    tracing::info!(
        products = products.len(),
        sources = batch.all_sources_map.len(),
        "normalizing dump"
    );

    let canonical =
        map_products_with_batch_data(&products, &batch, &BaseDeps, args.locale.as_deref());

    let out = if args.pretty {
        serde_json::to_string_pretty(&canonical)?
    } else {
        serde_json::to_string(&canonical)?
    };
    println!("{out}");

    eprintln!(
        "INFO: normalized {} products ({} with alternative sources)",
        canonical.len(),
        canonical
            .iter()
            .filter(|p| !p.alternative_sources.is_empty())
            .count()
    );
    Ok(())
}
