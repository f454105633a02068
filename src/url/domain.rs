use std::net::IpAddr;
use url::Url;

/// Extracts the host from a URL, lowercased
///
/// # Examples
///
/// ```
/// use url::Url;
/// use ls_crawler::url::extract_domain;
///
/// let url = Url::parse("https://WWW.Musterstadt.de/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("www.musterstadt.de".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns the registrable domain of a host
///
/// Uses the public suffix list, so subdomains are ignored and multi-label
/// suffixes are respected: `rathaus.musterstadt.de` gives `musterstadt.de`,
/// `www.example.co.uk` gives `example.co.uk`. IP addresses and hosts the list
/// has no answer for are returned unchanged.
///
/// ```
/// use ls_crawler::url::registrable_domain;
///
/// assert_eq!(registrable_domain("leichte-sprache.musterstadt.de"), "musterstadt.de");
/// assert_eq!(registrable_domain("www.example.co.uk"), "example.co.uk");
/// ```
pub fn registrable_domain(host: &str) -> String {
    let host = host.trim_end_matches('.').to_lowercase();
    let bare = host.trim_start_matches('[').trim_end_matches(']');

    if bare.parse::<IpAddr>().is_ok() {
        return host;
    }

    psl::domain_str(&host)
        .map(|d| d.to_string())
        .unwrap_or(host)
}

/// Returns the registrable domain of a URL's host, if it has one
pub fn url_registrable_domain(url: &Url) -> Option<String> {
    extract_domain(url).map(|host| registrable_domain(&host))
}

/// Returns true if both URLs belong to the same registrable domain
///
/// ```
/// use url::Url;
/// use ls_crawler::url::same_site;
///
/// let a = Url::parse("https://www.musterstadt.de/").unwrap();
/// let b = Url::parse("http://ls.musterstadt.de/start").unwrap();
/// let c = Url::parse("https://musterstadt.com/").unwrap();
/// assert!(same_site(&a, &b));
/// assert!(!same_site(&a, &c));
/// ```
pub fn same_site(a: &Url, b: &Url) -> bool {
    match (url_registrable_domain(a), url_registrable_domain(b)) {
        (Some(da), Some(db)) => da == db,
        _ => false,
    }
}

/// Returns true if the registrable domain sits under the German ccTLD
pub fn is_german_domain(url: &Url) -> bool {
    url_registrable_domain(url)
        .map(|d| d.ends_with(".de"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_domain() {
        let url = Url::parse("https://musterstadt.de/").unwrap();
        assert_eq!(extract_domain(&url), Some("musterstadt.de".to_string()));
    }

    #[test]
    fn test_extract_with_port() {
        let url = Url::parse("https://musterstadt.de:8080/").unwrap();
        assert_eq!(extract_domain(&url), Some("musterstadt.de".to_string()));
    }

    #[test]
    fn test_extract_mixed_case() {
        let url = Url::parse("https://Musterstadt.DE/").unwrap();
        assert_eq!(extract_domain(&url), Some("musterstadt.de".to_string()));
    }

    #[test]
    fn test_registrable_ignores_subdomains() {
        assert_eq!(registrable_domain("musterstadt.de"), "musterstadt.de");
        assert_eq!(registrable_domain("www.musterstadt.de"), "musterstadt.de");
        assert_eq!(
            registrable_domain("a.b.c.musterstadt.de"),
            "musterstadt.de"
        );
    }

    #[test]
    fn test_registrable_multi_label_suffix() {
        assert_eq!(registrable_domain("example.co.uk"), "example.co.uk");
        assert_eq!(registrable_domain("blog.example.co.uk"), "example.co.uk");
    }

    #[test]
    fn test_registrable_is_case_insensitive() {
        assert_eq!(registrable_domain("WWW.Musterstadt.DE"), "musterstadt.de");
    }

    #[test]
    fn test_registrable_ip_address_unchanged() {
        assert_eq!(registrable_domain("127.0.0.1"), "127.0.0.1");
        assert_eq!(registrable_domain("[::1]"), "[::1]");
    }

    #[test]
    fn test_same_site_across_subdomains() {
        let a = Url::parse("https://www.musterstadt.de/").unwrap();
        let b = Url::parse("https://leichte-sprache.musterstadt.de/").unwrap();
        assert!(same_site(&a, &b));
    }

    #[test]
    fn test_same_site_different_domains() {
        let a = Url::parse("https://musterstadt.de/").unwrap();
        let b = Url::parse("https://nachbarstadt.de/").unwrap();
        assert!(!same_site(&a, &b));
    }

    #[test]
    fn test_same_site_ip_ports() {
        let a = Url::parse("http://127.0.0.1:8080/").unwrap();
        let b = Url::parse("http://127.0.0.1:9090/ls").unwrap();
        assert!(same_site(&a, &b));
    }

    #[test]
    fn test_is_german_domain() {
        assert!(is_german_domain(
            &Url::parse("http://www.musterstadt.de/").unwrap()
        ));
        assert!(!is_german_domain(
            &Url::parse("http://www.musterstadt.at/").unwrap()
        ));
        assert!(!is_german_domain(
            &Url::parse("http://127.0.0.1/").unwrap()
        ));
    }
}
