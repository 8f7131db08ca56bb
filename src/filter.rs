//! Link admission: decides which discovered hrefs may enter the frontier

use crate::Rejection;
use url::Url;

/// Substrings that disqualify an href wherever they appear in it.
///
/// This is a literal substring match, not a scheme check: `/about#team` and
/// `/contact?via=mailto:` are both rejected.
pub const ILLEGAL_PATTERNS: [&str; 4] = ["mailto:", "tel:", "javascript:", "#"];

/// Resolve `raw_href` against `base` and admit it if it stays on `domain`.
///
/// The hostname comparison is exact string equality: `www.example.com` is a
/// different domain from `example.com`.
pub fn admit(raw_href: &str, base: &Url, domain: &str) -> Result<Url, Rejection> {
    if raw_href.is_empty() {
        return Err(Rejection::Empty);
    }

    if let Some(pattern) = ILLEGAL_PATTERNS
        .into_iter()
        .find(|pattern| raw_href.contains(pattern))
    {
        return Err(Rejection::IllegalPattern(pattern));
    }

    let resolved = base
        .join(raw_href)
        .map_err(|e| Rejection::Unresolvable(e.to_string()))?;

    match resolved.host_str() {
        Some(host) if host == domain => Ok(resolved),
        Some(host) => Err(Rejection::ForeignDomain(host.to_string())),
        None => Err(Rejection::ForeignDomain(String::new())),
    }
}

/// Whether `candidate` lies in the seed's subtree, by plain string prefix.
pub fn is_within_seed(candidate: &Url, seed_url: &str) -> bool {
    candidate.as_str().starts_with(seed_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/docs/intro").unwrap()
    }

    #[test]
    fn test_admits_relative_href() {
        let url = admit("/a", &base(), "example.com").unwrap();
        assert_eq!(url.as_str(), "https://example.com/a");

        let url = admit("setup", &base(), "example.com").unwrap();
        assert_eq!(url.as_str(), "https://example.com/docs/setup");
    }

    #[test]
    fn test_resolves_dot_segments() {
        let url = admit("../guide/./start", &base(), "example.com").unwrap();
        assert_eq!(url.as_str(), "https://example.com/guide/start");
    }

    #[test]
    fn test_keeps_query_string() {
        let url = admit("/search?q=rust", &base(), "example.com").unwrap();
        assert_eq!(url.as_str(), "https://example.com/search?q=rust");
    }

    #[test]
    fn test_rejects_empty_href() {
        assert_eq!(admit("", &base(), "example.com"), Err(Rejection::Empty));
    }

    #[test]
    fn test_rejects_illegal_patterns_anywhere() {
        assert_eq!(
            admit("mailto:a@b.com", &base(), "example.com"),
            Err(Rejection::IllegalPattern("mailto:"))
        );
        assert_eq!(
            admit("tel:+123456", &base(), "example.com"),
            Err(Rejection::IllegalPattern("tel:"))
        );
        assert_eq!(
            admit("javascript:void(0)", &base(), "example.com"),
            Err(Rejection::IllegalPattern("javascript:"))
        );
        assert_eq!(
            admit("/products#top", &base(), "example.com"),
            Err(Rejection::IllegalPattern("#"))
        );
        assert_eq!(
            admit("https://example.com/share?to=mailto:x", &base(), "example.com"),
            Err(Rejection::IllegalPattern("mailto:"))
        );
    }

    #[test]
    fn test_rejects_foreign_domain() {
        assert_eq!(
            admit("https://other.com/x", &base(), "example.com"),
            Err(Rejection::ForeignDomain("other.com".to_string()))
        );
    }

    #[test]
    fn test_subdomain_is_foreign() {
        assert!(matches!(
            admit("https://www.example.com/", &base(), "example.com"),
            Err(Rejection::ForeignDomain(_))
        ));
    }

    #[test]
    fn test_rejects_unresolvable_href() {
        assert!(matches!(
            admit("http://[::1", &base(), "example.com"),
            Err(Rejection::Unresolvable(_))
        ));
    }

    #[test]
    fn test_seed_prefix() {
        let seed = "https://example.com/docs/";
        let inside = Url::parse("https://example.com/docs/setup").unwrap();
        let sibling = Url::parse("https://example.com/blog/").unwrap();

        assert!(is_within_seed(&inside, seed));
        assert!(!is_within_seed(&sibling, seed));
    }
}
