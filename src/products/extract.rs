//! Product link and product detail extraction
//!
//! Listing pages (the leaf categories from the checkpoint) link to item
//! pages in two markups. Item pages carry one main container holding the
//! breadcrumb, title, price, stock counters, variant options, images and the
//! "about this item" spec table.

use crate::fetch::{attr, child_text, select, text_of, Page};
use crate::url::strip_query;
use scraper::ElementRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Classic result-list item links
pub const ITEM_LINK: &str = "a.s-item__link";

/// Browse-grid item links; only item-page hrefs are followed
pub const BROWSE_LINK: &str = "a.bsig__title__wrapper";

const ITEM_PATH_MARKER: &str = "ebay.com/itm/";

/// Main container of an item page
pub const DETAIL_CONTAINER: &str = ".vim.x-vi-evo-main-container.template-evo-avip";

const BREADCRUMB: &str = "nav.breadcrumbs li > a > span";
const TITLE: &str = "h1.x-item-title__mainTitle > span.ux-textspans.ux-textspans--BOLD";
const PRICE: &str = "div.x-price-primary > span";
const AVAILABLE: &str = "div.d-quantity__availability > div > span:first-child";
const SOLD: &str = "div.d-quantity__availability > div > span:last-child";
const VARIANT: &str = "label.x-msku__label";
const VARIANT_NAME: &str = "span.x-msku__label-text > span";
const VARIANT_OPTIONS: &str = "span.x-msku__select-box-wrapper > select > option:not(:first-child)";
const IMAGES: &str = "div.ux-image-carousel-container div[tabindex='0'] \
                      div.ux-image-carousel-item.image-treatment.image > img";
const SPEC_ROW: &str = "div.vim.x-about-this-item div.ux-layout-section-evo__col";
const SPEC_LABEL: &str = "div.ux-labels-values__labels-content span.ux-textspans";
const SPEC_VALUE: &str = "div.ux-labels-values__values-content span.ux-textspans";

/// A product record as written to the output file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub categories: Vec<String>,
    pub name: String,
    pub price: String,
    pub available: String,
    pub sold: String,
    pub image_links: Vec<String>,
    pub specs: BTreeMap<String, String>,
    pub attributes: BTreeMap<String, Vec<String>>,
}

/// Why an item container did not yield a product
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("Failed to scrape product {0}")]
    MissingField(&'static str),
}

/// Product page links on a listing page, query strings stripped
///
/// Each markup contributes at most `max_per_markup` links.
pub fn product_links(page: &Page, max_per_markup: usize) -> Vec<String> {
    let mut links = Vec::new();

    let items = page
        .select(ITEM_LINK)
        .into_iter()
        .take(max_per_markup)
        .map(|a| strip_query(attr(a, "href").unwrap_or_default()).to_string());
    links.extend(items);

    let browse = page
        .select(BROWSE_LINK)
        .into_iter()
        .map(|a| strip_query(attr(a, "href").unwrap_or_default()).to_string())
        .filter(|href| href.contains(ITEM_PATH_MARKER))
        .take(max_per_markup);
    links.extend(browse);

    for link in &links {
        tracing::debug!(url = %link, "Product url found");
    }
    links
}

/// Extracts products from every item container on `page`
pub fn extract_products(page: &Page) -> Vec<Result<Product, ExtractError>> {
    page.select(DETAIL_CONTAINER)
        .into_iter()
        .map(extract_product)
        .collect()
}

/// Extracts one product from an item container
pub fn extract_product(container: ElementRef<'_>) -> Result<Product, ExtractError> {
    let categories: Vec<String> = select(container, BREADCRUMB)
        .into_iter()
        .map(|span| text_of(span).trim().to_string())
        .filter(|text| !text.is_empty())
        .collect();
    if categories.is_empty() {
        return Err(ExtractError::MissingField("categories"));
    }

    let name = child_text(container, TITLE);
    if name.is_empty() {
        return Err(ExtractError::MissingField("name"));
    }

    let price = child_text(container, PRICE);
    if price.is_empty() {
        return Err(ExtractError::MissingField("price"));
    }

    Ok(Product {
        categories,
        name,
        price,
        available: child_text(container, AVAILABLE),
        sold: child_text(container, SOLD),
        image_links: image_links(container),
        specs: specs(container),
        attributes: attributes(container),
    })
}

fn attributes(container: ElementRef<'_>) -> BTreeMap<String, Vec<String>> {
    select(container, VARIANT)
        .into_iter()
        .map(|label| {
            let values = select(label, VARIANT_OPTIONS)
                .into_iter()
                .map(|option| text_of(option).trim().to_string())
                .collect();
            (child_text(label, VARIANT_NAME), values)
        })
        .collect()
}

// data-src holds the full-size image on lazily loaded carousels
fn image_links(container: ElementRef<'_>) -> Vec<String> {
    select(container, IMAGES)
        .into_iter()
        .filter_map(|img| {
            [attr(img, "data-src"), attr(img, "src")]
                .into_iter()
                .flatten()
                .find(|src| !src.is_empty())
                .map(str::to_string)
        })
        .collect()
}

fn specs(container: ElementRef<'_>) -> BTreeMap<String, String> {
    select(container, SPEC_ROW)
        .into_iter()
        .filter_map(|row| {
            let label = child_text(row, SPEC_LABEL);
            if label.is_empty() {
                return None;
            }
            Some((label, child_text(row, SPEC_VALUE)))
        })
        .collect()
}
