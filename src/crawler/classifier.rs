//! Leaf/branch page classification
//!
//! Catalog pages carry "feature modules" (carousels, visual navigation,
//! guidance panels). The root page renders the same non-category modules as a
//! leaf would, so a module whose title is anything other than
//! "Shop by Category" marks a leaf only when the page is the traversal root.
//! Pages without any feature module are branches.

use crate::fetch::{child_text, Page};
use url::Url;

/// Title of the navigation group that lists child categories
pub const SHOP_BY_CATEGORY: &str = "Shop by Category";

/// Feature module selectors, scanned in order
pub const FEATURE_MODULE_SELECTORS: [&str; 5] = [
    "section.b-module.b-carousel.b-guidance.b-display--landscape:first-of-type",
    "section.b-module.b-carousel.b-guidance--text.b-display--landscape:first-of-type",
    "section.seo-guidance.seo-guidance__guidance_module:first-of-type",
    "section.b-module.b-visualnav:first-of-type",
    "section.brw-product-carousel:first-of-type",
];

const MODULE_TITLE: &str = "h2.section-title__title";

/// Returns true if `page` is a leaf category page
pub fn is_leaf(page: &Page, root: &Url) -> bool {
    let url = page.url();
    let on_root = is_root_page(root, url);
    let mut leaf = false;

    for css in FEATURE_MODULE_SELECTORS {
        for module in page.select(css) {
            let title = child_text(module, MODULE_TITLE);
            if title.is_empty() {
                tracing::warn!(url = %url, "Carousel title empty");
                continue;
            }

            if title != SHOP_BY_CATEGORY && on_root {
                leaf = true;
            }
        }
    }

    tracing::debug!(url = %url, is_leaf = leaf, "Page type detected");
    leaf
}

/// Returns true if `url` is exactly the traversal root
pub fn is_root_page(root: &Url, url: &Url) -> bool {
    root == url
}
