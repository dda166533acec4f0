use anyhow::{Context, Result};
use colored::*;
use std::collections::{HashSet, VecDeque};
use std::path::Path;
use url::Url;

use crate::http::Transport;
use crate::scraper::{PageScraper, ScrapeOptions};

/// Bounded breadth-first mirror across same-domain pages.
///
/// Pages are scraped one at a time, each into its own `page_<n>/`
/// directory under the output root. The visited set is keyed by
/// fragment-stripped URL, so `/a#top` and `/a` count as one page.
pub struct SiteCrawler<'a> {
    transport: &'a dyn Transport,
    options: &'a ScrapeOptions,
    max_pages: usize,
}

/// Fragment-stripped form of a URL; the visited-set key.
pub fn visit_key(url: &Url) -> Url {
    let mut key = url.clone();
    key.set_fragment(None);
    key
}

impl<'a> SiteCrawler<'a> {
    pub fn new(transport: &'a dyn Transport, options: &'a ScrapeOptions, max_pages: usize) -> Self {
        Self {
            transport,
            options,
            max_pages,
        }
    }

    /// Returns the number of pages scraped. A page whose scrape fails is
    /// logged and skipped; the crawl moves on to the next frontier entry.
    pub async fn crawl(&self, start_url: &Url, output_dir: &Path) -> Result<usize> {
        let domain = start_url
            .host_str()
            .map(str::to_string)
            .context("start URL has no host")?;

        let scraper = PageScraper::new(self.transport, self.options);
        let mut frontier: VecDeque<Url> = VecDeque::from([start_url.clone()]);
        let mut visited: HashSet<Url> = HashSet::new();
        let mut scraped = 0;

        while scraped < self.max_pages {
            let Some(next) = frontier.pop_front() else {
                break;
            };
            let page_url = visit_key(&next);
            if visited.contains(&page_url) {
                continue;
            }

            println!(
                "\n🌐 Crawling ({}/{}): {}",
                scraped + 1,
                self.max_pages,
                page_url.as_str().blue()
            );
            let page_dir = output_dir.join(format!("page_{}", scraped + 1));
            match scraper.scrape(&page_url, &page_dir).await {
                Ok(report) => {
                    visited.insert(page_url);
                    scraped += 1;
                    for link in report.page_links {
                        if link.host_str() == Some(domain.as_str()) && !visited.contains(&link) {
                            frontier.push_back(link);
                        }
                    }
                }
                Err(e) => {
                    eprintln!("{} error scraping {}: {:#}", "❌".red(), page_url, e);
                }
            }
        }

        println!("\n✅ Finished crawling {} pages", scraped);
        Ok(scraped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visit_key_strips_fragments() {
        let with_fragment = Url::parse("https://x.test/a#section").unwrap();
        let without = Url::parse("https://x.test/a").unwrap();
        assert_eq!(visit_key(&with_fragment), without);
        assert_eq!(visit_key(&without), without);
    }
}
