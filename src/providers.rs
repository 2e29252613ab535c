//! Provider identity helpers.
//!
//! Provider names arrive free-form ("DMM", "dmm ", "Dmm.R18") and are only
//! ever meaningful case-insensitively. Human-readable labels are injected by
//! the caller (`MapperDeps::provider_label`); this module owns the machine
//! identity only.

/// Canonical comparison key for a free-form provider name: trimmed,
/// lowercased, non-alphanumerics stripped.
pub fn normalize_provider_key(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Whether a (free-form) provider name refers to the DTI affiliate network.
pub fn is_dti_provider(raw: &str) -> bool {
    normalize_provider_key(raw) == "dti"
}

/// Canonical redirect-domain affiliate link for DTI listings. DTI is the one
/// provider whose per-source URLs must not be passed through verbatim; the
/// redirect domain is the only stable click target the network honors.
pub fn dti_direct_link(original_id: &str) -> String {
    format!("https://click.dtiserv.com/Direct/{}", original_id.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_provider_key() {
        assert_eq!(normalize_provider_key("DMM"), "dmm");
        assert_eq!(normalize_provider_key("  Sokmil  "), "sokmil");
        assert_eq!(normalize_provider_key("Dmm.R18"), "dmmr18");
        assert_eq!(normalize_provider_key(""), "");
    }

    #[test]
    fn test_is_dti_provider_case_insensitive() {
        assert!(is_dti_provider("DTI"));
        assert!(is_dti_provider(" dti "));
        assert!(!is_dti_provider("duga"));
    }

    #[test]
    fn test_dti_direct_link() {
        assert_eq!(
            dti_direct_link("010124-001"),
            "https://click.dtiserv.com/Direct/010124-001"
        );
    }
}
