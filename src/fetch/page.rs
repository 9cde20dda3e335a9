//! Parsed HTML pages and selector helpers
//!
//! Handlers receive a [`Page`] for every fetched HTML response. The helpers
//! here mirror the handful of DOM operations the crawl needs: scoped
//! iteration over a CSS selector, the combined text of matching children, and
//! attribute lookup.

use crate::fetch::collector::Request;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// A fetched page with its parsed document
pub struct Page {
    request: Request,
    document: Html,
}

impl Page {
    /// Parses an HTML body for a request
    pub fn parse(request: Request, body: &str) -> Self {
        Self {
            request,
            document: Html::parse_document(body),
        }
    }

    /// The request that produced this page
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// The URL the page was requested with
    pub fn url(&self) -> &Url {
        &self.request.url
    }

    /// Depth of the page below the visit's root
    pub fn depth(&self) -> u32 {
        self.request.depth
    }

    /// The `<body>` element, or the document root when there is none
    pub fn body(&self) -> ElementRef<'_> {
        select(self.document.root_element(), "body")
            .into_iter()
            .next()
            .unwrap_or_else(|| self.document.root_element())
    }

    /// Elements inside the body matching `css`, in document order
    pub fn select(&self, css: &str) -> Vec<ElementRef<'_>> {
        select(self.body(), css)
    }
}

/// Descendants of `scope` matching `css`, in document order
///
/// An invalid selector logs an error and matches nothing.
pub fn select<'a>(scope: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => scope.select(&selector).collect(),
        Err(e) => {
            tracing::error!("Invalid selector '{}': {:?}", css, e);
            Vec::new()
        }
    }
}

/// Trimmed text of every descendant of `scope` matching `css`, concatenated
pub fn child_text(scope: ElementRef<'_>, css: &str) -> String {
    select(scope, css)
        .into_iter()
        .map(text_of)
        .collect::<String>()
        .trim()
        .to_string()
}

/// Text content of an element and its descendants
pub fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// Value of an attribute, if present
pub fn attr<'a>(element: ElementRef<'a>, name: &str) -> Option<&'a str> {
    element.value().attr(name)
}
