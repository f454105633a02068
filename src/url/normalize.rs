use crate::UrlError;
use url::Url;

/// Schemes the crawler is willing to fetch
const FETCHABLE_SCHEMES: &[&str] = &["http", "https"];

/// Normalizes a seed line into an absolute, fetchable URL
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace
/// 2. Reject explicit schemes other than http/https (e.g. `mailto:`, `ftp://`)
/// 3. Prepend `http://` when the input contains no `://`
/// 4. Parse the URL; reject if malformed or if it has no host
///
/// # Arguments
///
/// * `raw` - The raw seed string (a hostname or a full URL)
///
/// # Returns
///
/// * `Ok(Url)` - The absolute URL to start crawling from
/// * `Err(UrlError)` - The input cannot be crawled
///
/// # Examples
///
/// ```
/// use ls_crawler::url::normalize_seed;
///
/// let url = normalize_seed("musterstadt.de").unwrap();
/// assert_eq!(url.as_str(), "http://musterstadt.de/");
///
/// assert!(normalize_seed("mailto:info@musterstadt.de").is_err());
/// ```
pub fn normalize_seed(raw: &str) -> Result<Url, UrlError> {
    let trimmed = raw.trim();

    if let Some(scheme) = href_scheme(trimmed) {
        if !FETCHABLE_SCHEMES.contains(&scheme.as_str()) {
            return Err(UrlError::InvalidScheme(format!(
                "Only HTTP and HTTPS schemes are supported, got: {}",
                scheme
            )));
        }
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };

    let url = Url::parse(&with_scheme).map_err(|e| UrlError::Parse(format!("{}: {}", trimmed, e)))?;

    if !FETCHABLE_SCHEMES.contains(&url.scheme()) {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}

/// Returns the explicit scheme of an href, lowercased
///
/// Relative (`/ls/`, `seite.html`) and scheme-relative (`//host/x`) hrefs have
/// no scheme. A `host:port` prefix is not mistaken for a scheme.
///
/// ```
/// use ls_crawler::url::href_scheme;
///
/// assert_eq!(href_scheme("MAILTO:info@example.de"), Some("mailto".to_string()));
/// assert_eq!(href_scheme("/leichte-sprache/"), None);
/// assert_eq!(href_scheme("example.de:8080/ls"), None);
/// ```
pub fn href_scheme(href: &str) -> Option<String> {
    let href = href.trim_start();
    let colon = href.find(':')?;
    let (scheme, rest) = href.split_at(colon);

    let mut chars = scheme.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic()
        || !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    {
        return None;
    }

    // `host:8080/...` is an authority with a port, not a scheme
    let after = rest[1..].split(['/', '?', '#']).next().unwrap_or("");
    if !after.is_empty() && after.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    Some(scheme.to_ascii_lowercase())
}

/// Resolves an href against the page it was found on
///
/// Returns None for unresolvable hrefs and for anything that does not end up
/// as an http(s) URL. The fragment is dropped since it never changes the
/// fetched document.
pub fn resolve_href(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let mut resolved = base.join(href).ok()?;
    if !FETCHABLE_SCHEMES.contains(&resolved.scheme()) || resolved.host_str().is_none() {
        return None;
    }

    resolved.set_fragment(None);
    Some(resolved)
}

/// Builds the key used to recognise a URL that was already fetched
///
/// Two URLs that differ only in fragment or in the order of their query
/// parameters share a key.
pub fn dedup_key(url: &Url) -> String {
    let mut key = url.clone();
    key.set_fragment(None);

    if key.query().is_some() {
        let params = sorted_query_params(&key);
        if params.is_empty() {
            key.set_query(None);
        } else {
            key.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    key.to_string()
}

/// Derives the homepage identifier from a seed: the seed with its scheme removed
///
/// ```
/// use ls_crawler::url::homepage_id;
///
/// assert_eq!(homepage_id("https://www.musterstadt.de"), "www.musterstadt.de");
/// assert_eq!(homepage_id("musterstadt.de"), "musterstadt.de");
/// ```
pub fn homepage_id(seed: &str) -> String {
    let seed = seed.trim();
    let lower = seed.to_ascii_lowercase();

    for prefix in ["http://", "https://"] {
        if lower.starts_with(prefix) {
            return seed[prefix.len()..].to_string();
        }
    }

    seed.to_string()
}

/// Returns query parameters sorted by key, then value
fn sorted_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    params.sort();
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_host_gets_http() {
        let result = normalize_seed("musterstadt.de").unwrap();
        assert_eq!(result.as_str(), "http://musterstadt.de/");
    }

    #[test]
    fn test_https_seed_kept() {
        let result = normalize_seed("https://www.musterstadt.de/start").unwrap();
        assert_eq!(result.as_str(), "https://www.musterstadt.de/start");
    }

    #[test]
    fn test_seed_whitespace_trimmed() {
        let result = normalize_seed("  musterstadt.de\n").unwrap();
        assert_eq!(result.host_str(), Some("musterstadt.de"));
    }

    #[test]
    fn test_seed_host_with_port() {
        let result = normalize_seed("localhost:8080/start").unwrap();
        assert_eq!(result.port(), Some(8080));
        assert_eq!(result.path(), "/start");
    }

    #[test]
    fn test_invalid_scheme() {
        let result = normalize_seed("ftp://musterstadt.de/");
        assert!(matches!(result.unwrap_err(), UrlError::InvalidScheme(_)));
    }

    #[test]
    fn test_mailto_seed_rejected() {
        let result = normalize_seed("mailto:info@musterstadt.de");
        assert!(matches!(result.unwrap_err(), UrlError::InvalidScheme(_)));
    }

    #[test]
    fn test_malformed_seed() {
        assert!(normalize_seed("http://").is_err());
        assert!(normalize_seed("not a url").is_err());
    }

    #[test]
    fn test_href_scheme_detection() {
        assert_eq!(href_scheme("http://a.de/"), Some("http".to_string()));
        assert_eq!(href_scheme("HTTPS://a.de/"), Some("https".to_string()));
        assert_eq!(href_scheme("javascript:void(0)"), Some("javascript".to_string()));
        assert_eq!(href_scheme("tel:+49301234"), Some("tel".to_string()));
    }

    #[test]
    fn test_href_without_scheme() {
        assert_eq!(href_scheme("/ls/"), None);
        assert_eq!(href_scheme("seite.html"), None);
        assert_eq!(href_scheme("//other.de/ls"), None);
        assert_eq!(href_scheme("?lang=de-plain"), None);
        assert_eq!(href_scheme("#top"), None);
        assert_eq!(href_scheme("/a:b"), None);
    }

    #[test]
    fn test_resolve_relative_href() {
        let base = Url::parse("http://musterstadt.de/rathaus/index.html").unwrap();
        let resolved = resolve_href(&base, "../ls/").unwrap();
        assert_eq!(resolved.as_str(), "http://musterstadt.de/ls/");
    }

    #[test]
    fn test_resolve_drops_fragment() {
        let base = Url::parse("http://musterstadt.de/").unwrap();
        let resolved = resolve_href(&base, "/ls/#inhalt").unwrap();
        assert_eq!(resolved.as_str(), "http://musterstadt.de/ls/");
    }

    #[test]
    fn test_resolve_rejects_non_http() {
        let base = Url::parse("http://musterstadt.de/").unwrap();
        assert!(resolve_href(&base, "mailto:info@musterstadt.de").is_none());
        assert!(resolve_href(&base, "javascript:alert(1)").is_none());
        assert!(resolve_href(&base, "").is_none());
        assert!(resolve_href(&base, "   ").is_none());
    }

    #[test]
    fn test_dedup_key_ignores_fragment_and_param_order() {
        let a = Url::parse("http://musterstadt.de/ls?b=2&a=1#oben").unwrap();
        let b = Url::parse("http://musterstadt.de/ls?a=1&b=2").unwrap();
        assert_eq!(dedup_key(&a), dedup_key(&b));
    }

    #[test]
    fn test_dedup_key_distinguishes_paths() {
        let a = Url::parse("http://musterstadt.de/ls").unwrap();
        let b = Url::parse("http://musterstadt.de/ls/").unwrap();
        assert_ne!(dedup_key(&a), dedup_key(&b));
    }

    #[test]
    fn test_homepage_id_strips_scheme_only() {
        assert_eq!(homepage_id("http://musterstadt.de"), "musterstadt.de");
        assert_eq!(homepage_id("HTTPS://Musterstadt.de/"), "Musterstadt.de/");
        assert_eq!(homepage_id("musterstadt.de"), "musterstadt.de");
    }
}
