//! Row validators: defensive, allocation-light predicates and coercers that
//! turn loosely-shaped provider rows (`serde_json::Value`) into typed row
//! structs.
//!
//! Contract for every function here: accept anything, return a typed value or
//! an absent marker. Malformed individual rows are dropped; malformed whole
//! payloads degrade to empty collections. Nothing in this layer panics or
//! returns an error.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};

use crate::model::{
    ImageRow, PerformerRow, RawPerformerRow, RawProductRow, RawSourceRow, SaleRow, TagRow,
    VideoRow,
};

static EMPTY_ROWS: &[Value] = &[];

/// True for everything except the two nullish shapes a JSON row can carry:
/// an absent key (`None`) and an explicit `null`.
pub fn is_not_nullish(v: Option<&Value>) -> bool {
    matches!(v, Some(val) if !val.is_null())
}

pub fn is_string(v: &Value) -> bool {
    v.is_string()
}

/// Finite number check; NaN never counts as a number.
pub fn is_number(v: &Value) -> bool {
    v.as_f64().is_some_and(|f| f.is_finite())
}

/// Integer strictly greater than zero. Fractional values do not qualify.
pub fn is_positive_integer(v: &Value) -> bool {
    v.as_i64().is_some_and(|n| n > 0)
}

/// Object literal check: arrays and null are not objects.
pub fn is_object(v: &Value) -> bool {
    v.is_object()
}

pub fn is_array(v: &Value) -> bool {
    v.is_array()
}

pub fn has_property(v: &Value, key: &str) -> bool {
    v.as_object().is_some_and(|obj| obj.contains_key(key))
}

/// Structural check that a loosely-typed row carries every required key.
/// Used to decide whether a row can be trusted before extracting fields.
pub fn is_db_row(v: &Value, required_keys: &[&str]) -> bool {
    match v.as_object() {
        Some(obj) => required_keys.iter().all(|k| obj.contains_key(*k)),
        None => false,
    }
}

/// Coerce a number or numeric string into `f64`. Garbage strings are absent,
/// never silently zero.
pub fn to_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Coerce a number or numeric string into `i64`. Fractional input is absent.
pub fn to_integer(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// A trimmed, non-empty string or nothing.
pub fn to_nonempty_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        _ => None,
    }
}

/// Pick the first present key out of a candidate list. Rows reach this core
/// from different subsystems with camelCase or snake_case key naming for the
/// same logical field, so every field lookup goes through this single helper
/// rather than scattered per-call-site checks.
fn pick<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k))
}

/// Exact-type field extractor: the field must already be a finite number.
pub fn get_number_field(row: &Value, keys: &[&str]) -> Option<f64> {
    let obj = row.as_object()?;
    pick(obj, keys).filter(|v| is_number(v)).and_then(Value::as_f64)
}

/// Exact-type field extractor for integer fields.
pub fn get_integer_field(row: &Value, keys: &[&str]) -> Option<i64> {
    let obj = row.as_object()?;
    pick(obj, keys).and_then(Value::as_i64)
}

/// Exact-type field extractor: the field must be a string.
pub fn get_string_field(row: &Value, keys: &[&str]) -> Option<String> {
    let obj = row.as_object()?;
    pick(obj, keys).and_then(Value::as_str).map(str::to_string)
}

pub fn get_boolean_field(row: &Value, keys: &[&str]) -> Option<bool> {
    let obj = row.as_object()?;
    pick(obj, keys).and_then(Value::as_bool)
}

/// String field parsed as a date. Accepts RFC 3339 as well as the plain
/// `YYYY-MM-DD[ HH:MM:SS]` forms providers emit; unparsable strings are
/// absent, not an error.
pub fn get_date_field(row: &Value, keys: &[&str]) -> Option<DateTime<Utc>> {
    let raw = get_string_field(row, keys)?;
    parse_date_value(&raw)
}

fn parse_date_value(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|ndt| Utc.from_utc_datetime(&ndt));
    }
    None
}

/// Array field where every element must be a string; one bad element rejects
/// the whole field.
pub fn get_string_array_field(row: &Value, keys: &[&str]) -> Option<Vec<String>> {
    let obj = row.as_object()?;
    let arr = pick(obj, keys)?.as_array()?;
    let mut out = Vec::with_capacity(arr.len());
    for el in arr {
        out.push(el.as_str()?.to_string());
    }
    Some(out)
}

/// Accept either a bare array or an object carrying a `rows` array — both
/// are valid query-result shapes in this system. Anything else degrades to
/// an empty slice rather than failing.
pub fn extract_rows_array(v: &Value) -> &[Value] {
    match v {
        Value::Array(arr) => arr,
        Value::Object(obj) => match obj.get("rows") {
            Some(Value::Array(arr)) => arr,
            _ => EMPTY_ROWS,
        },
        _ => EMPTY_ROWS,
    }
}

/// Map a row list to validated numeric ids, silently dropping rows whose id
/// field is not a number.
pub fn extract_ids(v: &Value, keys: &[&str]) -> Vec<i64> {
    extract_rows_array(v)
        .iter()
        .filter_map(|row| {
            let obj = row.as_object()?;
            pick(obj, keys).and_then(to_integer)
        })
        .collect()
}

pub fn extract_product_ids(v: &Value) -> Vec<i64> {
    extract_ids(v, &["id"])
}

pub fn extract_performer_ids(v: &Value) -> Vec<i64> {
    extract_ids(v, &["id"])
}

fn row_id(obj: &Map<String, Value>) -> i64 {
    pick(obj, &["id"]).and_then(to_integer).unwrap_or(0)
}

fn row_product_id(obj: &Map<String, Value>) -> i64 {
    pick(obj, &["productId", "product_id"])
        .and_then(to_integer)
        .unwrap_or(0)
}

fn row_string(obj: &Map<String, Value>, keys: &[&str]) -> String {
    pick(obj, keys)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn row_opt_string(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    pick(obj, keys).and_then(to_nonempty_string)
}

/// Normalize one performer credit row. Missing fields take defined defaults
/// (`id: 0`, `name: ""`, kana absent); only a non-object input is rejected.
pub fn to_performer_row(v: &Value) -> Option<PerformerRow> {
    let obj = v.as_object()?;
    Some(PerformerRow {
        id: row_id(obj),
        product_id: row_product_id(obj),
        name: row_string(obj, &["name"]),
        name_kana: row_opt_string(obj, &["nameKana", "name_kana"]),
        name_en: row_opt_string(obj, &["nameEn", "name_en"]),
    })
}

pub fn to_tag_row(v: &Value) -> Option<TagRow> {
    let obj = v.as_object()?;
    Some(TagRow {
        id: row_id(obj),
        product_id: row_product_id(obj),
        name: row_string(obj, &["name"]),
        category: row_opt_string(obj, &["category"]),
    })
}

pub fn to_image_row(v: &Value) -> Option<ImageRow> {
    let obj = v.as_object()?;
    Some(ImageRow {
        id: row_id(obj),
        product_id: row_product_id(obj),
        url: row_string(obj, &["url", "imageUrl", "image_url"]),
        image_type: row_opt_string(obj, &["imageType", "image_type", "type"]),
        display_order: pick(obj, &["displayOrder", "display_order"])
            .and_then(to_integer)
            .unwrap_or(0),
    })
}

pub fn to_video_row(v: &Value) -> Option<VideoRow> {
    let obj = v.as_object()?;
    Some(VideoRow {
        id: row_id(obj),
        product_id: row_product_id(obj),
        url: row_string(obj, &["url", "videoUrl", "video_url"]),
        video_type: row_opt_string(obj, &["videoType", "video_type", "type"]),
        display_order: pick(obj, &["displayOrder", "display_order"])
            .and_then(to_integer)
            .unwrap_or(0),
    })
}

pub fn to_source_row(v: &Value) -> Option<RawSourceRow> {
    let obj = v.as_object()?;
    Some(RawSourceRow {
        product_id: row_product_id(obj),
        provider: row_string(obj, &["provider", "providerName", "provider_name"]),
        original_id: row_string(obj, &["originalId", "original_id"]),
        affiliate_url: row_string(obj, &["affiliateUrl", "affiliate_url", "url"]),
        price: pick(obj, &["price"]).and_then(to_integer),
        currency: row_opt_string(obj, &["currency"]),
        product_type: row_opt_string(obj, &["productType", "product_type"]),
    })
}

pub fn to_sale_row(v: &Value) -> Option<SaleRow> {
    let obj = v.as_object()?;
    Some(SaleRow {
        product_id: row_product_id(obj),
        regular_price: pick(obj, &["regularPrice", "regular_price"]).and_then(to_integer),
        sale_price: pick(obj, &["salePrice", "sale_price"]).and_then(to_integer),
        discount_percent: pick(obj, &["discountPercent", "discount_percent", "discount"])
            .and_then(to_integer),
        sale_end_at: get_date_field(v, &["saleEndAt", "sale_end_at"]),
    })
}

pub fn to_product_row(v: &Value) -> Option<RawProductRow> {
    let obj = v.as_object()?;
    Some(RawProductRow {
        id: row_id(obj),
        title: row_string(obj, &["title"]),
        title_en: row_opt_string(obj, &["titleEn", "title_en"]),
        description: row_opt_string(obj, &["description"]),
        description_en: row_opt_string(obj, &["descriptionEn", "description_en"]),
        normalized_code: row_opt_string(obj, &["normalizedCode", "normalized_code"]),
        maker_code: row_opt_string(obj, &["makerCode", "maker_code"]),
        release_date: get_date_field(v, &["releaseDate", "release_date"])
            .map(|dt| dt.date_naive()),
        duration_minutes: pick(obj, &["durationMinutes", "duration_minutes", "duration"])
            .and_then(to_integer),
        default_thumbnail_url: row_opt_string(
            obj,
            &["defaultThumbnailUrl", "default_thumbnail_url", "thumbnailUrl", "thumbnail_url"],
        ),
    })
}

/// Normalize one performer profile row (actress page shape).
pub fn to_performer_profile_row(v: &Value) -> Option<RawPerformerRow> {
    let obj = v.as_object()?;
    Some(RawPerformerRow {
        id: row_id(obj),
        name: row_string(obj, &["name"]),
        name_kana: row_opt_string(obj, &["nameKana", "name_kana"]),
        name_en: row_opt_string(obj, &["nameEn", "name_en"]),
        bio: row_opt_string(obj, &["bio", "description"]),
        bio_en: row_opt_string(obj, &["bioEn", "bio_en", "descriptionEn", "description_en"]),
        services: get_string_array_field(v, &["services"]),
        aliases: get_string_array_field(v, &["aliases"]),
    })
}

macro_rules! batch_normalizer {
    ($name:ident, $single:ident, $row:ty, $kind:literal) => {
        /// Batch variant: unwraps either result shape, drops malformed
        /// elements, keeps the rest.
        pub fn $name(v: &Value) -> Vec<$row> {
            let rows = extract_rows_array(v);
            let mut out = Vec::with_capacity(rows.len());
            for row in rows {
                match $single(row) {
                    Some(parsed) => out.push(parsed),
                    None => {
                        tracing::debug!(kind = $kind, "dropping malformed row");
                    }
                }
            }
            out
        }
    };
}

batch_normalizer!(to_performer_rows, to_performer_row, PerformerRow, "performer");
batch_normalizer!(to_tag_rows, to_tag_row, TagRow, "tag");
batch_normalizer!(to_image_rows, to_image_row, ImageRow, "image");
batch_normalizer!(to_video_rows, to_video_row, VideoRow, "video");
batch_normalizer!(to_source_rows, to_source_row, RawSourceRow, "source");
batch_normalizer!(to_sale_rows, to_sale_row, SaleRow, "sale");
batch_normalizer!(to_product_rows, to_product_row, RawProductRow, "product");
batch_normalizer!(
    to_performer_profile_rows,
    to_performer_profile_row,
    RawPerformerRow,
    "performer_profile"
);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_not_nullish() {
        assert!(!is_not_nullish(None));
        assert!(!is_not_nullish(Some(&Value::Null)));
        assert!(is_not_nullish(Some(&json!(0))));
        assert!(is_not_nullish(Some(&json!(""))));
        assert!(is_not_nullish(Some(&json!(false))));
    }

    #[test]
    fn test_primitive_guards() {
        assert!(is_number(&json!(1.5)));
        assert!(!is_number(&json!("1.5")));
        assert!(is_positive_integer(&json!(3)));
        assert!(!is_positive_integer(&json!(0)));
        assert!(!is_positive_integer(&json!(2.5)));
        assert!(is_object(&json!({})));
        assert!(!is_object(&json!([])));
        assert!(!is_object(&Value::Null));
        assert!(is_array(&json!([1])));
    }

    #[test]
    fn test_to_number_never_coerces_garbage() {
        assert_eq!(to_number(&json!("abc")), None);
        assert_eq!(to_number(&json!("")), None);
        assert_eq!(to_number(&json!(null)), None);
        assert_eq!(to_number(&json!(true)), None);
        assert_eq!(to_number(&json!("42")), Some(42.0));
        assert_eq!(to_number(&json!(" 7.5 ")), Some(7.5));
        assert_eq!(to_number(&json!(12)), Some(12.0));
    }

    #[test]
    fn test_to_integer_rejects_fractional() {
        assert_eq!(to_integer(&json!(9)), Some(9));
        assert_eq!(to_integer(&json!("9")), Some(9));
        assert_eq!(to_integer(&json!(9.5)), None);
        assert_eq!(to_integer(&json!("9.5")), None);
    }

    #[test]
    fn test_is_db_row() {
        let row = json!({"id": 1, "name": "x"});
        assert!(is_db_row(&row, &["id", "name"]));
        assert!(!is_db_row(&row, &["id", "missing"]));
        assert!(!is_db_row(&json!([1]), &["id"]));
    }

    #[test]
    fn test_field_extractors_exact_type() {
        let row = json!({"n": "12", "s": 12, "b": "true", "ok": true});
        assert_eq!(get_number_field(&row, &["n"]), None);
        assert_eq!(get_string_field(&row, &["s"]), None);
        assert_eq!(get_boolean_field(&row, &["b"]), None);
        assert_eq!(get_boolean_field(&row, &["ok"]), Some(true));
    }

    #[test]
    fn test_get_date_field() {
        let row = json!({
            "a": "2024-03-01",
            "b": "2024-03-01 12:30:00",
            "c": "2024-03-01T12:30:00Z",
            "bad": "next tuesday",
        });
        assert!(get_date_field(&row, &["a"]).is_some());
        assert!(get_date_field(&row, &["b"]).is_some());
        assert!(get_date_field(&row, &["c"]).is_some());
        assert_eq!(get_date_field(&row, &["bad"]), None);
    }

    #[test]
    fn test_get_string_array_field_rejects_mixed() {
        let row = json!({"good": ["a", "b"], "mixed": ["a", 1]});
        assert_eq!(
            get_string_array_field(&row, &["good"]),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(get_string_array_field(&row, &["mixed"]), None);
    }

    #[test]
    fn test_extract_rows_array_round_trips() {
        let bare = json!([1, 2, 3]);
        assert_eq!(extract_rows_array(&bare), [json!(1), json!(2), json!(3)]);
        let wrapped = json!({"rows": [1, 2, 3]});
        assert_eq!(extract_rows_array(&wrapped), [json!(1), json!(2), json!(3)]);
        assert!(extract_rows_array(&json!("nope")).is_empty());
        assert!(extract_rows_array(&json!({"data": []})).is_empty());
        assert!(extract_rows_array(&Value::Null).is_empty());
    }

    #[test]
    fn test_extract_ids_drops_non_numeric() {
        let rows = json!([{"id": 1}, {"id": "2"}, {"id": "x"}, {"name": "no id"}]);
        assert_eq!(extract_ids(&rows, &["id"]), vec![1, 2]);
        assert_eq!(extract_product_ids(&json!({"rows": [{"id": 5}]})), vec![5]);
    }

    #[test]
    fn test_performer_rows_casing_invariance() {
        let camel = json!([{"id": 1, "productId": 9, "name": "葵つかさ", "nameKana": "あおいつかさ"}]);
        let snake = json!([{"id": 1, "product_id": 9, "name": "葵つかさ", "name_kana": "あおいつかさ"}]);
        assert_eq!(to_performer_rows(&camel), to_performer_rows(&snake));
    }

    #[test]
    fn test_source_rows_casing_invariance() {
        let camel = json!({"rows": [{
            "productId": 3, "provider": "DMM", "originalId": "abc00123",
            "affiliateUrl": "https://example.com/a", "price": 1980, "currency": "JPY"
        }]});
        let snake = json!([{
            "product_id": 3, "provider": "DMM", "original_id": "abc00123",
            "affiliate_url": "https://example.com/a", "price": "1980", "currency": "JPY"
        }]);
        assert_eq!(to_source_rows(&camel), to_source_rows(&snake));
    }

    #[test]
    fn test_row_defaults_for_missing_fields() {
        let rows = to_performer_rows(&json!([{}]));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 0);
        assert_eq!(rows[0].name, "");
        assert_eq!(rows[0].name_kana, None);
    }

    #[test]
    fn test_batch_normalizer_drops_malformed_elements() {
        let rows = json!([{"id": 1, "name": "ok"}, "garbage", 42, null]);
        assert_eq!(to_tag_rows(&rows).len(), 1);
        // Whole payload malformed: empty collection, not an error.
        assert!(to_tag_rows(&json!(123)).is_empty());
    }

    #[test]
    fn test_product_row_parses_dates_and_duration() {
        let row = json!({
            "id": 10, "title": "T", "release_date": "2024-06-01",
            "duration": "120", "defaultThumbnailUrl": "https://img.example.com/t.jpg"
        });
        let parsed = to_product_row(&row).unwrap();
        assert_eq!(parsed.duration_minutes, Some(120));
        assert_eq!(
            parsed.release_date,
            NaiveDate::from_ymd_opt(2024, 6, 1)
        );
        assert_eq!(
            parsed.default_thumbnail_url.as_deref(),
            Some("https://img.example.com/t.jpg")
        );
    }
}
