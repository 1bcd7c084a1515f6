/// Normalizes a hostname for pattern comparison
///
/// Lowercases and strips a trailing root dot, so `Example.COM.` and
/// `example.com` compare equal.
pub fn normalize_host(host: &str) -> String {
    host.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// Checks if a hostname matches a site pattern
///
/// Two pattern forms are supported:
/// 1. Exact: `example.com` matches only `example.com`
/// 2. Suffix: `*.example.com` matches `example.com` and every subdomain of it
///
/// Both sides are normalized with [`normalize_host`] first.
///
/// # Examples
///
/// ```
/// use scrape_batch::url::matches_host_pattern;
///
/// assert!(matches_host_pattern("example.com", "EXAMPLE.com"));
/// assert!(!matches_host_pattern("example.com", "www.example.com"));
///
/// assert!(matches_host_pattern("*.example.com", "example.com"));
/// assert!(matches_host_pattern("*.example.com", "shop.eu.example.com"));
/// assert!(!matches_host_pattern("*.example.com", "notexample.com"));
/// ```
pub fn matches_host_pattern(pattern: &str, host: &str) -> bool {
    let pattern = normalize_host(pattern);
    let host = normalize_host(host);

    match pattern.strip_prefix("*.") {
        Some(base) => {
            host == base
                || host
                    .strip_suffix(base)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        }
        None => host == pattern,
    }
}
