//! Media URL normalization.
//!
//! Provider image feeds are messy: thumbnail-resolution links, protocol-less
//! `//host/...` URLs, and occasionally a whole HTML fragment pasted into a
//! URL column. Everything here is pure and total — unresolvable input
//! degrades to [`PLACEHOLDER_IMAGE`], never to an error.

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Well-known placeholder identifier substituted for unresolvable media.
pub const PLACEHOLDER_IMAGE: &str = "/img/noimage.png";

fn src_attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"src=["']([^"']+)["']"#).expect("valid src pattern"))
}

fn is_absolute_http(raw: &str) -> bool {
    match Url::parse(raw) {
        Ok(url) => matches!(url.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// Validate and repair one image URL.
///
/// - nullish/empty input returns the placeholder
/// - HTML fragments (`<img src="...">` pasted into a URL column) have their
///   `src` value extracted and validated
/// - protocol-relative `//host/path` is promoted to https
/// - anything that does not validate as an absolute http(s) URL becomes the
///   placeholder
pub fn normalize_image_url(raw: Option<&str>) -> String {
    let Some(input) = raw else {
        return PLACEHOLDER_IMAGE.to_string();
    };
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return PLACEHOLDER_IMAGE.to_string();
    }

    if trimmed.contains('<') || trimmed.contains('>') {
        if let Some(caps) = src_attr_re().captures(trimmed) {
            let extracted = caps[1].trim();
            let candidate = promote_protocol_relative(extracted);
            if is_absolute_http(&candidate) {
                return candidate;
            }
        }
        tracing::debug!(input = %trimmed, "unresolvable html fragment in url field");
        return PLACEHOLDER_IMAGE.to_string();
    }

    let candidate = promote_protocol_relative(trimmed);
    if is_absolute_http(&candidate) {
        return candidate;
    }
    tracing::debug!(input = %trimmed, "url failed absolute http validation");
    PLACEHOLDER_IMAGE.to_string()
}

fn promote_protocol_relative(raw: &str) -> String {
    if let Some(rest) = raw.strip_prefix("//") {
        format!("https://{rest}")
    } else {
        raw.to_string()
    }
}

type RewriteFn = fn(&str) -> Option<String>;

/// One provider's thumbnail-to-full-size convention. The table is evaluated
/// top to bottom; adding a provider is a data addition, not a control-flow
/// change.
struct ProviderRule {
    domain: &'static str,
    rewrite: RewriteFn,
}

static PROVIDER_RULES: &[ProviderRule] = &[
    // Suffix-letter convention: package shots end ps/pt/pm, full size is pl.
    ProviderRule { domain: "dmm.co.jp", rewrite: rewrite_suffix_letter_pl },
    ProviderRule { domain: "dmm.com", rewrite: rewrite_suffix_letter_pl },
    ProviderRule { domain: "mgstage.com", rewrite: rewrite_mgstage },
    ProviderRule { domain: "sokmil.com", rewrite: rewrite_underscore_small },
    // Size is carried as query parameters; full size is the bare path.
    ProviderRule { domain: "duga.jp", rewrite: rewrite_strip_size_query },
    // DTI network sites share the s/ vs l/ directory convention.
    ProviderRule { domain: "caribbeancom.com", rewrite: rewrite_dti_small_dir },
    ProviderRule { domain: "caribbeancompr.com", rewrite: rewrite_dti_small_dir },
    ProviderRule { domain: "1pondo.tv", rewrite: rewrite_dti_small_dir },
    ProviderRule { domain: "10musume.com", rewrite: rewrite_dti_small_dir },
    ProviderRule { domain: "pacopacomama.com", rewrite: rewrite_dti_small_dir },
    ProviderRule { domain: "heyzo.com", rewrite: rewrite_underscore_small },
    ProviderRule { domain: "tokyo-hot.com", rewrite: rewrite_tokyo_hot },
    ProviderRule { domain: "muramura.tv", rewrite: rewrite_dti_small_dir },
];

fn rewrite_suffix_letter_pl(url: &str) -> Option<String> {
    for suffix in ["ps.jpg", "pt.jpg", "pm.jpg"] {
        if let Some(stem) = url.strip_suffix(suffix) {
            return Some(format!("{stem}pl.jpg"));
        }
    }
    None
}

fn rewrite_mgstage(url: &str) -> Option<String> {
    if url.contains("pf_t1_") {
        return Some(url.replacen("pf_t1_", "pf_e_", 1));
    }
    None
}

fn rewrite_underscore_small(url: &str) -> Option<String> {
    if url.contains("_s.") {
        return Some(url.replacen("_s.", "_l.", 1));
    }
    None
}

fn rewrite_strip_size_query(url: &str) -> Option<String> {
    let (path, query) = url.split_once('?')?;
    let keep: Vec<&str> = query
        .split('&')
        .filter(|kv| {
            let key = kv.split('=').next().unwrap_or("");
            !matches!(key, "w" | "h" | "width" | "height" | "size")
        })
        .collect();
    if keep.len() == query.split('&').count() {
        return None;
    }
    if keep.is_empty() {
        Some(path.to_string())
    } else {
        Some(format!("{path}?{}", keep.join("&")))
    }
}

fn rewrite_dti_small_dir(url: &str) -> Option<String> {
    if url.contains("/images/s/") {
        return Some(url.replacen("/images/s/", "/images/l/", 1));
    }
    if url.contains("-s.") {
        return Some(url.replacen("-s.", "-l.", 1));
    }
    None
}

fn rewrite_tokyo_hot(url: &str) -> Option<String> {
    if url.contains("/scap/") {
        return Some(url.replacen("/scap/", "/cap/", 1));
    }
    None
}

// Generic fallback substitutions tried when no provider rule matched. First
// alteration wins.
static FALLBACK_CHAIN: &[(&str, &str)] = &[
    ("/thumb/", "/large/"),
    ("_thumb.", "."),
    ("/small/", "/large/"),
];

/// Rewrite a thumbnail-resolution URL to its full-resolution equivalent.
///
/// Pure and total: empty input returns empty, and a URL no rule recognizes
/// is returned unchanged, which also makes the function idempotent on
/// already-full-size URLs.
pub fn full_size_image_url(url: &str) -> String {
    if url.is_empty() {
        return String::new();
    }
    for rule in PROVIDER_RULES {
        if url.contains(rule.domain) {
            if let Some(rewritten) = (rule.rewrite)(url) {
                return rewritten;
            }
            // Recognized provider but no specific rule fired; fall through
            // to the generic chain.
            break;
        }
    }
    for (needle, replacement) in FALLBACK_CHAIN {
        if url.contains(needle) {
            return url.replacen(needle, replacement, 1);
        }
    }
    url.to_string()
}

/// Sub-provider identities within the DTI affiliate network. Downstream
/// display logic uses the classification to decide whether a content blur
/// applies; this core only supplies the classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DtiService {
    Caribbeancom,
    CaribbeancomPr,
    OnePondo,
    TenMusume,
    Pacopacomama,
    Heyzo,
    TokyoHot,
    Muramura,
}

impl DtiService {
    /// Stable key used wherever the service is persisted or compared.
    pub fn key(&self) -> &'static str {
        match self {
            DtiService::Caribbeancom => "caribbeancom",
            DtiService::CaribbeancomPr => "caribbeancompr",
            DtiService::OnePondo => "1pondo",
            DtiService::TenMusume => "10musume",
            DtiService::Pacopacomama => "pacopacomama",
            DtiService::Heyzo => "heyzo",
            DtiService::TokyoHot => "tokyohot",
            DtiService::Muramura => "muramura",
        }
    }

    /// Whether the service publishes uncensored material.
    pub fn is_uncensored(&self) -> bool {
        // The whole current roster is uncensored; the method exists so a
        // censored DTI property can be added without touching call sites.
        true
    }
}

/// Classify a URL into a DTI sub-provider purely from domain substrings.
/// `None` means "not a recognized DTI property".
pub fn dti_service_from_url(url: &str) -> Option<DtiService> {
    let lowered = url.to_ascii_lowercase();
    // caribbeancompr must be tested before caribbeancom: the latter is a
    // substring of the former.
    if lowered.contains("caribbeancompr.com") {
        return Some(DtiService::CaribbeancomPr);
    }
    if lowered.contains("caribbeancom.com") {
        return Some(DtiService::Caribbeancom);
    }
    if lowered.contains("1pondo.tv") {
        return Some(DtiService::OnePondo);
    }
    if lowered.contains("10musume.com") {
        return Some(DtiService::TenMusume);
    }
    if lowered.contains("pacopacomama.com") {
        return Some(DtiService::Pacopacomama);
    }
    if lowered.contains("heyzo.com") {
        return Some(DtiService::Heyzo);
    }
    if lowered.contains("tokyo-hot.com") {
        return Some(DtiService::TokyoHot);
    }
    if lowered.contains("muramura.tv") {
        return Some(DtiService::Muramura);
    }
    None
}

pub fn is_dti_uncensored_site(url: &str) -> bool {
    dti_service_from_url(url).is_some_and(|svc| svc.is_uncensored())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_nullish_inputs_share_placeholder() {
        assert_eq!(normalize_image_url(None), PLACEHOLDER_IMAGE);
        assert_eq!(normalize_image_url(Some("")), PLACEHOLDER_IMAGE);
        assert_eq!(normalize_image_url(Some("   ")), PLACEHOLDER_IMAGE);
    }

    #[test]
    fn test_normalize_extracts_src_from_html_fragment() {
        let fragment = r#"<img class="pkg" src="https://pics.dmm.co.jp/mono/abc/ps.jpg" />"#;
        assert_eq!(
            normalize_image_url(Some(fragment)),
            "https://pics.dmm.co.jp/mono/abc/ps.jpg"
        );
        // Extraction failure or a relative src both fall back.
        assert_eq!(normalize_image_url(Some("<img>")), PLACEHOLDER_IMAGE);
        assert_eq!(
            normalize_image_url(Some(r#"<img src="/relative/p.jpg">"#)),
            PLACEHOLDER_IMAGE
        );
    }

    #[test]
    fn test_normalize_promotes_protocol_relative() {
        assert_eq!(
            normalize_image_url(Some("//cdn.example.com/a.jpg")),
            "https://cdn.example.com/a.jpg"
        );
    }

    #[test]
    fn test_normalize_rejects_non_http() {
        assert_eq!(normalize_image_url(Some("ftp://x/a.jpg")), PLACEHOLDER_IMAGE);
        assert_eq!(normalize_image_url(Some("not a url")), PLACEHOLDER_IMAGE);
        assert_eq!(
            normalize_image_url(Some("https://cdn.example.com/ok.jpg")),
            "https://cdn.example.com/ok.jpg"
        );
    }

    #[test]
    fn test_full_size_provider_rules() {
        assert_eq!(
            full_size_image_url("https://pics.dmm.co.jp/mono/movie/adult/abc123/abc123ps.jpg"),
            "https://pics.dmm.co.jp/mono/movie/adult/abc123/abc123pl.jpg"
        );
        assert_eq!(
            full_size_image_url("https://image.mgstage.com/images/x/pf_t1_0001.jpg"),
            "https://image.mgstage.com/images/x/pf_e_0001.jpg"
        );
        assert_eq!(
            full_size_image_url("https://www.caribbeancom.com/moviepages/010124-001/images/s/001.jpg"),
            "https://www.caribbeancom.com/moviepages/010124-001/images/l/001.jpg"
        );
        assert_eq!(
            full_size_image_url("https://duga.jp/imgs/a.jpg?w=160&h=120"),
            "https://duga.jp/imgs/a.jpg"
        );
        assert_eq!(
            full_size_image_url("https://my.tokyo-hot.com/media/scap/n0001.jpg"),
            "https://my.tokyo-hot.com/media/cap/n0001.jpg"
        );
    }

    #[test]
    fn test_full_size_generic_fallback_chain() {
        assert_eq!(
            full_size_image_url("https://cdn.example.com/thumb/a.jpg"),
            "https://cdn.example.com/large/a.jpg"
        );
        assert_eq!(
            full_size_image_url("https://cdn.example.com/a_thumb.jpg"),
            "https://cdn.example.com/a.jpg"
        );
    }

    #[test]
    fn test_full_size_is_idempotent_and_total() {
        let full = "https://pics.dmm.co.jp/mono/movie/adult/abc123/abc123pl.jpg";
        assert_eq!(full_size_image_url(full), full);
        assert_eq!(full_size_image_url(&full_size_image_url(full)), full);
        let unknown = "https://cdn.unknown.example/abc.png";
        assert_eq!(full_size_image_url(unknown), unknown);
        assert_eq!(full_size_image_url(""), "");
    }

    #[test]
    fn test_dti_service_classification() {
        assert_eq!(
            dti_service_from_url("https://www.caribbeancom.com/moviepages/x/"),
            Some(DtiService::Caribbeancom)
        );
        assert_eq!(
            dti_service_from_url("https://en.caribbeancompr.com/x"),
            Some(DtiService::CaribbeancomPr)
        );
        assert_eq!(
            dti_service_from_url("https://www.1pondo.tv/movies/010124_001/"),
            Some(DtiService::OnePondo)
        );
        assert_eq!(dti_service_from_url("https://store.example.com/x"), None);
        assert!(is_dti_uncensored_site("https://www.heyzo.com/moviepages/1/"));
        assert!(!is_dti_uncensored_site("https://www.dmm.co.jp/x"));
    }
}
