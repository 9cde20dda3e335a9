//! Child category scheduling for branch pages
//!
//! Branch pages list their sub-categories in one of two navigation layouts.
//! Only groups titled "Shop by Category" contribute links. Each layout gets
//! its own fan-out counter: the counter is checked before a link is scheduled
//! and incremented after every scheduling attempt, so a layout schedules at
//! most `max_per_page + 1` links per page.

use crate::crawler::classifier::SHOP_BY_CATEGORY;
use crate::fetch::{attr, child_text, select, text_of, LinkQueue, Page};

/// A navigation layout that can list child categories
#[derive(Debug, Clone, Copy)]
pub struct NavLayout {
    pub name: &'static str,
    pub group: &'static str,
    pub title: &'static str,
    pub link: &'static str,
    /// Skip links whose text contains "See all"
    pub skip_see_all: bool,
}

/// Section-per-group layout used on most category pages
pub const SECTION_LAYOUT: NavLayout = NavLayout {
    name: "section",
    group: "div.dialog__cell > section:first-of-type",
    title: "h2.section-title__title",
    link: "a.b-textlink",
    skip_see_all: true,
};

/// Sidebar navigation layout used on browse pages
pub const NAV_LAYOUT: NavLayout = NavLayout {
    name: "nav",
    group: "section.brw-category-nav.brw-has-parentnode:first-of-type",
    title: "span.textual-display.brw-category-nav__title",
    link: "a.textual-display.brw-category-nav__link",
    skip_see_all: false,
};

/// Layouts in the order they are tried
pub const LAYOUTS: [NavLayout; 2] = [SECTION_LAYOUT, NAV_LAYOUT];

const SEE_ALL: &str = "See all";

/// Schedules child categories of a branch page from every layout
///
/// Returns the number of scheduling attempts made.
pub fn expand(page: &Page, max_per_page: usize, queue: &impl LinkQueue) -> usize {
    LAYOUTS
        .iter()
        .map(|layout| expand_layout(page, layout, max_per_page, queue))
        .sum()
}

/// Schedules child categories from one layout
///
/// Failures to schedule a link are logged and still count towards the cap.
pub fn expand_layout(
    page: &Page,
    layout: &NavLayout,
    max_per_page: usize,
    queue: &impl LinkQueue,
) -> usize {
    let url = page.url();
    let mut count = 0;

    for group in page.select(layout.group) {
        let title = child_text(group, layout.title);
        if title.is_empty() {
            tracing::warn!(url = %url, layout = layout.name, "Carousel title empty");
            continue;
        }

        if title != SHOP_BY_CATEGORY {
            continue;
        }

        for link in select(group, layout.link) {
            if layout.skip_see_all && text_of(link).contains(SEE_ALL) {
                continue;
            }

            if count > max_per_page {
                break;
            }

            let href = attr(link, "href").unwrap_or_default();
            match queue.visit(href) {
                Ok(child) => tracing::debug!(url = %child, parent = %url, "Scheduled child category"),
                Err(e) => tracing::error!(href = href, parent = %url, "Visiting Err: {}", e),
            }
            count += 1;
        }
    }

    count
}
