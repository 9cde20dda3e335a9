use crate::VisitError;
use url::Url;

/// Parses a string that must already be an absolute http(s) URL
///
/// # Examples
///
/// ```
/// use leafwalk::url::parse_absolute;
///
/// assert!(parse_absolute("https://www.ebay.com/b/Toys/220").is_ok());
/// assert!(parse_absolute("/b/Toys/220").is_err());
/// ```
pub fn parse_absolute(raw: &str) -> Result<Url, VisitError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(VisitError::MissingUrl);
    }

    let url = Url::parse(raw).map_err(|e| VisitError::InvalidUrl {
        href: raw.to_string(),
        reason: e.to_string(),
    })?;

    ensure_http(url)
}

/// Resolves an href found on a page into an absolute http(s) URL
///
/// Relative hrefs are joined onto the page URL. Empty hrefs, fragment-only
/// hrefs and non-http schemes (`javascript:`, `mailto:`, `tel:`, `data:`) are
/// rejected.
pub fn resolve_link(href: &str, base: &Url) -> Result<Url, VisitError> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return Err(VisitError::MissingUrl);
    }

    let url = base.join(href).map_err(|e| VisitError::InvalidUrl {
        href: href.to_string(),
        reason: e.to_string(),
    })?;

    ensure_http(url)
}

fn ensure_http(url: Url) -> Result<Url, VisitError> {
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(VisitError::UnsupportedScheme(other.to_string())),
    }
}

/// Drops the query string (and anything after it) from an href
///
/// Listing pages decorate product links with tracking parameters that would
/// otherwise defeat the visited-set and the response cache.
pub fn strip_query(href: &str) -> &str {
    href.split('?').next().unwrap_or(href)
}
