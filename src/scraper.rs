use anyhow::{Context, Result};
use colored::*;
use select::document::Document;
use select::predicate::Name;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::browser::BrowserSession;
use crate::downloader;
use crate::dynamic_discovery;
use crate::http::Transport;
use crate::locator;
use crate::rewrite;
use crate::static_discovery;
use crate::storage::FileStore;

/// Tunables shared by single-page scrapes and crawls.
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    /// Pause between successful asset downloads.
    pub delay: Duration,
    /// Wait after navigation for asynchronous activity to settle.
    pub settle: Duration,
    /// Applied to both the HTTP client and the browser session.
    pub user_agent: String,
}

/// Summary of one scraped page.
#[derive(Debug)]
pub struct ScrapeReport {
    pub assets_found: usize,
    pub downloaded: usize,
    pub failed: usize,
    /// Hyperlink targets found on the page, fragment-stripped; feeds the
    /// crawl frontier.
    pub page_links: Vec<Url>,
    pub index_file: PathBuf,
}

/// One-page orchestrator: fetch, discover, download, rewrite, persist.
pub struct PageScraper<'a> {
    transport: &'a dyn Transport,
    options: &'a ScrapeOptions,
}

impl<'a> PageScraper<'a> {
    pub fn new(transport: &'a dyn Transport, options: &'a ScrapeOptions) -> Self {
        Self { transport, options }
    }

    pub async fn scrape(&self, page_url: &Url, output_dir: &Path) -> Result<ScrapeReport> {
        println!("📥 Scraping {}", page_url.as_str().blue());

        let html = self.fetch_page(page_url).await?;
        let document = Document::from(html.as_str());
        let store = FileStore::new(output_dir)?;

        // The static scan and the network trace have no data dependency
        // on each other.
        let (static_refs, dynamic_result) = futures::join!(
            static_discovery::discover(&document, page_url, self.transport),
            dynamic_discovery::discover(page_url, self.options.settle, &self.options.user_agent),
        );
        let dynamic_refs = match dynamic_result {
            Ok(refs) => refs,
            Err(e) => {
                eprintln!("{} dynamic discovery unavailable: {:#}", "⚠️".yellow(), e);
                HashSet::new()
            }
        };
        println!(
            "🔍 Found {} static + {} dynamic asset references",
            static_refs.len(),
            dynamic_refs.len()
        );

        let mut references = static_refs;
        references.extend(dynamic_refs);

        let assets = locator::resolve_all(&references, page_url, store.root());
        println!("📦 {} unique assets to download", assets.len());

        let outcome =
            downloader::download_assets(self.transport, &store, &assets, self.options.delay).await;

        let rewritten = rewrite::rewrite_html(&html, &outcome, page_url, store.root());
        let index_file = store.write_page(&rewritten)?;

        let report = ScrapeReport {
            assets_found: assets.len(),
            downloaded: outcome.completed_count(),
            failed: outcome.failed().len(),
            page_links: page_links(&document, page_url),
            index_file,
        };
        println!(
            "✅ Saved {} ({}/{} assets downloaded, {} failed)",
            report.index_file.display(),
            report.downloaded,
            report.assets_found,
            report.failed
        );
        Ok(report)
    }

    /// Direct GET first; pages that reject plain HTTP clients are
    /// retrieved through a rendered browser session instead.
    async fn fetch_page(&self, page_url: &Url) -> Result<String> {
        let direct = match self.transport.get_text(page_url).await {
            Ok(html) => return Ok(html),
            Err(e) => e,
        };
        eprintln!(
            "{} direct fetch failed ({:#}), falling back to a rendered session",
            "⚠️".yellow(),
            direct
        );

        let session = BrowserSession::launch(&self.options.user_agent)
            .await
            .with_context(|| format!("direct and rendered fetch both failed for {}", page_url))?;
        let source = match session.goto(page_url, self.options.settle).await {
            Ok(()) => session.rendered_source().await,
            Err(e) => Err(e),
        };
        session.close().await;

        source.with_context(|| format!("direct and rendered fetch both failed for {}", page_url))
    }
}

/// Hyperlink targets on the page, resolved against its URL and
/// fragment-stripped.
fn page_links(document: &Document, page_url: &Url) -> Vec<Url> {
    let mut links = Vec::new();
    for node in document.find(Name("a")) {
        if let Some(href) = node.attr("href") {
            if let Ok(mut target) = page_url.join(href) {
                target.set_fragment(None);
                links.push(target);
            }
        }
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_links_are_resolved_and_defragmented() {
        let html = r#"
            <html><body>
                <a href="/about">About</a>
                <a href="team#intro">Team</a>
                <a href="https://other.example.org/">Elsewhere</a>
            </body></html>
        "#;
        let document = Document::from(html);
        let page_url = Url::parse("https://example.com/pages/").unwrap();

        let links = page_links(&document, &page_url);
        let as_strings: Vec<&str> = links.iter().map(Url::as_str).collect();

        assert_eq!(
            as_strings,
            vec![
                "https://example.com/about",
                "https://example.com/pages/team",
                "https://other.example.org/",
            ]
        );
    }
}
