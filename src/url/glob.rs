use url::Url;

/// Checks if a host matches a domain glob
///
/// Two kinds of glob are supported:
/// 1. Exact: "www.ebay.com" matches only "www.ebay.com"
/// 2. Wildcard: "*.ebay.com" matches "ebay.com" and any subdomain of it
///
/// A lone "*" matches every host. Comparison ignores ASCII case.
///
/// # Examples
///
/// ```
/// use leafwalk::url::host_matches_glob;
///
/// assert!(host_matches_glob("*.ebay.com", "www.ebay.com"));
/// assert!(host_matches_glob("*.ebay.com", "ebay.com"));
/// assert!(!host_matches_glob("*.ebay.com", "notebay.com"));
/// ```
pub fn host_matches_glob(glob: &str, host: &str) -> bool {
    let glob = glob.to_ascii_lowercase();
    let host = host.to_ascii_lowercase();

    if glob == "*" {
        return true;
    }

    match glob.strip_prefix("*.") {
        Some(base) => host == base || host.ends_with(&format!(".{}", base)),
        None => host == glob,
    }
}

/// Checks if a URL's host matches a domain glob
///
/// URLs without a host never match.
pub fn url_matches_glob(glob: &str, url: &Url) -> bool {
    url.host_str()
        .map(|host| host_matches_glob(glob, host))
        .unwrap_or(false)
}
