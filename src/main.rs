use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;
use url::Url;

mod browser;
mod cli;
mod crawler;
mod downloader;
mod dynamic_discovery;
mod http;
mod locator;
mod rewrite;
mod scraper;
mod static_discovery;
mod storage;

use cli::ScrapeCommand;
use crawler::SiteCrawler;
use http::{HttpClient, RetryPolicy};
use scraper::{PageScraper, ScrapeOptions};

#[tokio::main]
async fn main() -> Result<()> {
    let args = ScrapeCommand::parse();

    let start_url =
        Url::parse(&args.url).with_context(|| format!("invalid URL: {}", args.url))?;
    let transport = HttpClient::new(
        &args.user_agent,
        Duration::from_secs(args.timeout),
        RetryPolicy::default(),
    )?;
    let options = ScrapeOptions {
        delay: Duration::from_secs_f64(args.delay),
        settle: Duration::from_secs_f64(args.wait),
        user_agent: args.user_agent.clone(),
    };

    if args.crawl {
        let crawler = SiteCrawler::new(&transport, &options, args.max_pages);
        crawler.crawl(&start_url, &args.output).await?;
    } else {
        let scraper = PageScraper::new(&transport, &options);
        scraper.scrape(&start_url, &args.output).await?;
    }

    Ok(())
}
