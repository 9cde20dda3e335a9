//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run both passes
//! end-to-end. Stalls are simulated with a response delay longer than the
//! client timeout, mounted for a single request ahead of the normal mock.

use leafwalk::config::Config;
use leafwalk::crawler::RetryReport;
use leafwalk::products::Product;
use leafwalk::{run_category_pass, run_product_pass};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LEAF_MODULE: &str = r#"<section class="b-module b-visualnav">
    <h2 class="section-title__title">Trending in Toys</h2></section>"#;

/// Creates a test configuration rooted at `/b/root` on the mock server
fn create_test_config(server: &MockServer, dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.crawl.target_url = Some(format!("{}/b/root", server.uri()));
    config.fetch.cache_dir = None;
    config.fetch.timeout_secs = 1;
    config.fetch.connect_timeout_secs = 1;
    config.output.categories_file = dir.path().join("leaf_categories.txt");
    config.output.output_file = dir.path().join("output/scraped_data.jsonl");
    config
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><head><title>t</title></head><body>{}</body></html>", body),
        "text/html",
    )
}

fn stalled() -> ResponseTemplate {
    html("").set_delay(Duration::from_secs(3))
}

fn item_page(name: &str) -> String {
    format!(
        r#"<div class="vim x-vi-evo-main-container template-evo-avip">
          <nav class="breadcrumbs"><ul><li><a href="/b/root"><span>Toys</span></a></li></ul></nav>
          <h1 class="x-item-title__mainTitle"><span class="ux-textspans ux-textspans--BOLD">{}</span></h1>
          <div class="x-price-primary"><span>US $9.99</span></div>
        </div>"#,
        name
    )
}

fn listing(base: &str, items: &[&str]) -> String {
    items
        .iter()
        .map(|id| {
            format!(
                r#"<a class="s-item__link" href="{}/itm/{}?hash=item">item</a>"#,
                base, id
            )
        })
        .collect()
}

async fn mount_items(server: &MockServer, names: &[&str]) {
    for name in names {
        Mock::given(method("GET"))
            .and(path(format!("/itm/{}", name)))
            .respond_with(html(&item_page(name)))
            .mount(server)
            .await;
    }
}

async fn requests_to(server: &MockServer, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == route)
        .count()
}

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

fn read_products(path: &Path) -> Vec<Product> {
    read_lines(path)
        .iter()
        .map(|l| serde_json::from_str(l).expect("product line should be valid JSON"))
        .collect()
}

#[tokio::test]
async fn test_root_stall_then_success_records_leaf() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);

    Mock::given(method("GET"))
        .and(path("/b/root"))
        .respond_with(stalled())
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b/root"))
        .respond_with(html(LEAF_MODULE))
        .mount(&server)
        .await;

    let report = run_category_pass(&config).await.expect("category pass should start");

    assert!(matches!(report, RetryReport::Succeeded { attempts: 2 }));
    assert_eq!(
        read_lines(&config.output.categories_file),
        vec![format!("{}/b/root", server.uri())]
    );
}

#[tokio::test]
async fn test_branch_fan_out_per_layout() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &dir);
    config.crawl.max_categories_per_page = 5;

    let sections: String = (0..6)
        .map(|i| format!(r#"<a class="b-textlink" href="/b/s{}">Section {}</a>"#, i, i))
        .collect();
    let nav: String = (0..6)
        .map(|i| {
            format!(
                r#"<a class="textual-display brw-category-nav__link" href="/b/n{}">Nav {}</a>"#,
                i, i
            )
        })
        .collect();
    let root = format!(
        r#"<div class="dialog__cell"><section><h2 class="section-title__title">Shop by Category</h2>{}</section></div>
        <section class="brw-category-nav brw-has-parentnode"><span class="textual-display brw-category-nav__title">Shop by Category</span>{}</section>"#,
        sections, nav
    );

    Mock::given(method("GET"))
        .and(path("/b/root"))
        .respond_with(html(&root))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/b/[sn]\d+$"))
        .respond_with(html("<p>empty branch</p>"))
        .mount(&server)
        .await;

    let report = run_category_pass(&config).await.unwrap();
    assert!(report.is_success());

    let children = server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() != "/b/root")
        .count();
    assert_eq!(children, 12);
    assert!(read_lines(&config.output.categories_file).is_empty());
}

#[tokio::test]
async fn test_root_not_found_aborts_category_pass() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);

    Mock::given(method("GET"))
        .and(path("/b/root"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let report = run_category_pass(&config).await.unwrap();

    assert!(matches!(report, RetryReport::Aborted { attempt: 1, .. }));
    assert_eq!(requests_to(&server, "/b/root").await, 1);
    assert!(config.output.categories_file.exists());
}

#[tokio::test]
async fn test_product_pass_three_leaves() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);
    let base = server.uri();

    for (leaf, item) in [("1", "alpha"), ("2", "beta"), ("3", "gamma")] {
        Mock::given(method("GET"))
            .and(path(format!("/b/leaf{}", leaf)))
            .respond_with(html(&listing(&base, &[item])))
            .mount(&server)
            .await;
    }
    mount_items(&server, &["alpha", "beta", "gamma"]).await;
    std::fs::write(
        &config.output.categories_file,
        format!("{b}/b/leaf1\n{b}/b/leaf2\n{b}/b/leaf3\n", b = base),
    )
    .unwrap();

    let summary = run_product_pass(&config).await.expect("product pass should start");

    assert!(matches!(summary.report, RetryReport::Succeeded { attempts: 1 }));
    assert_eq!(summary.products, 3);
    let mut names: Vec<String> = read_products(&config.output.output_file)
        .into_iter()
        .map(|p| p.name)
        .collect();
    names.sort();
    assert_eq!(names, vec!["alpha", "beta", "gamma"]);
}

#[tokio::test]
async fn test_product_pass_resumes_after_stall() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/b/leaf2"))
        .respond_with(stalled())
        .up_to_n_times(1)
        .mount(&server)
        .await;
    for leaf in ["1", "2", "3"] {
        Mock::given(method("GET"))
            .and(path(format!("/b/leaf{}", leaf)))
            .respond_with(html(&listing(&base, &[format!("item{}", leaf).as_str()])))
            .mount(&server)
            .await;
    }
    mount_items(&server, &["item1", "item2", "item3"]).await;
    std::fs::write(
        &config.output.categories_file,
        format!("{b}/b/leaf1\n{b}/b/leaf2\n{b}/b/leaf3", b = base),
    )
    .unwrap();

    let summary = run_product_pass(&config).await.unwrap();

    assert!(matches!(summary.report, RetryReport::Succeeded { attempts: 2 }));
    assert_eq!(requests_to(&server, "/b/leaf1").await, 1);
    assert_eq!(requests_to(&server, "/b/leaf2").await, 2);
    assert_eq!(requests_to(&server, "/b/leaf3").await, 1);
    assert_eq!(summary.cursor.line, 3);
    assert_eq!(summary.products, 3);
}

#[tokio::test]
async fn test_full_run_from_root_to_products() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);
    let base = server.uri();

    // The root is a leaf, so it is also the only listing page
    let root = format!("{}{}", LEAF_MODULE, listing(&base, &["kite", "yoyo"]));
    Mock::given(method("GET"))
        .and(path("/b/root"))
        .respond_with(html(&root))
        .mount(&server)
        .await;
    mount_items(&server, &["kite", "yoyo"]).await;

    let categories = run_category_pass(&config).await.unwrap();
    assert!(categories.is_success());

    let products = run_product_pass(&config).await.unwrap();
    assert!(products.report.is_success());

    let records = read_products(&config.output.output_file);
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|p| p.categories == vec!["Toys"]));
    assert!(records.iter().all(|p| p.price == "US $9.99"));
}

#[tokio::test]
async fn test_cli_missing_url_exits_with_failure() {
    let dir = TempDir::new().unwrap();

    let output = tokio::process::Command::new(env!("CARGO_BIN_EXE_leafwalk"))
        .current_dir(dir.path())
        .env_remove("RUST_LOG")
        .output()
        .await
        .expect("binary should run");

    assert_eq!(output.status.code(), Some(1));
}

#[tokio::test]
async fn test_cli_skip_category_scraping() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/b/leaf1"))
        .respond_with(html(&listing(&base, &["only"])))
        .mount(&server)
        .await;
    mount_items(&server, &["only"]).await;

    let checkpoint = dir.path().join("leaves.txt");
    let output_file = dir.path().join("out/products.jsonl");
    std::fs::write(&checkpoint, format!("{}/b/leaf1\n", base)).unwrap();

    let output = tokio::process::Command::new(env!("CARGO_BIN_EXE_leafwalk"))
        .current_dir(dir.path())
        .arg("--url")
        .arg(format!("{}/b/root", base))
        .arg("--skip-category-scraping")
        .arg("--no-cache")
        .arg("--categories-file")
        .arg(&checkpoint)
        .arg("--output")
        .arg(&output_file)
        .arg("--log-level")
        .arg("info")
        .output()
        .await
        .expect("binary should run");

    assert!(output.status.success());
    assert_eq!(requests_to(&server, "/b/root").await, 0);
    let products = read_products(&output_file);
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].name, "only");
    // Checkpoint is read, never rewritten
    assert_eq!(read_lines(&checkpoint), vec![format!("{}/b/leaf1", base)]);
}
