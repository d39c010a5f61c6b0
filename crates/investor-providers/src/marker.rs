//! Verification return marker on the portal's own URL.
//!
//! The marker is a navigation hint only. Its presence triggers exactly one
//! confirmation call; it never proves verification.

use url::Url;

/// Default query parameter marking a return from the verification provider.
pub const DEFAULT_RETURN_PARAM: &str = "verification_return";

/// True when `url` carries the `param` query parameter.
pub fn detect_return_marker(url: &Url, param: &str) -> bool {
    url.query_pairs().any(|(key, _)| key == param)
}

/// Copy of `url` with every `param` query pair removed.
///
/// Other parameters keep their order. An emptied query is dropped entirely
/// so the canonical URL has no trailing `?`.
pub fn strip_return_marker(url: &Url, param: &str) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != param)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut canonical = url.clone();
    if kept.is_empty() {
        canonical.set_query(None);
    } else {
        canonical.query_pairs_mut().clear().extend_pairs(kept);
    }
    canonical
}

/// `base` with the marker appended; used as the provider's return URL.
pub fn with_return_marker(base: &Url, param: &str) -> Url {
    let mut url = strip_return_marker(base, param);
    url.query_pairs_mut().append_pair(param, "1");
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn detects_marker_with_or_without_value() {
        let param = DEFAULT_RETURN_PARAM;
        assert!(detect_return_marker(&url("https://portal.test/?verification_return=1"), param));
        assert!(detect_return_marker(&url("https://portal.test/?a=b&verification_return"), param));
        assert!(!detect_return_marker(&url("https://portal.test/"), param));
        assert!(!detect_return_marker(&url("https://portal.test/?verification=1"), param));
    }

    #[test]
    fn strip_drops_empty_query() {
        let stripped = strip_return_marker(
            &url("https://portal.test/investors?verification_return=1"),
            DEFAULT_RETURN_PARAM,
        );
        assert_eq!(stripped.as_str(), "https://portal.test/investors");
    }

    #[test]
    fn strip_keeps_other_params_in_order() {
        let stripped = strip_return_marker(
            &url("https://portal.test/?tab=docs&verification_return=1&lang=en"),
            DEFAULT_RETURN_PARAM,
        );
        assert_eq!(stripped.as_str(), "https://portal.test/?tab=docs&lang=en");
        assert!(!detect_return_marker(&stripped, DEFAULT_RETURN_PARAM));
    }

    #[test]
    fn return_url_carries_marker_once() {
        let base = url("https://portal.test/investors?verification_return=1");
        let ret = with_return_marker(&base, DEFAULT_RETURN_PARAM);
        assert_eq!(
            ret.as_str(),
            "https://portal.test/investors?verification_return=1"
        );
    }
}
