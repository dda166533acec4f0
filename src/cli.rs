use clap::Parser;
use std::path::PathBuf;

/// Default user agent: a realistic desktop browser string, since some
/// sites reject obviously non-browser clients outright.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36";

#[derive(Parser, Debug)]
#[command(
    name = "sitesnap",
    about = "Download a static copy of a web page with every asset it references",
    version,
    long_about = "Fetches a page, discovers its assets both from the markup and from a rendered browser session's network trace, downloads them into css/, js/, images/ and assets/ folders, and rewrites the page to use the local copies. Optionally crawls same-domain links breadth-first."
)]
pub struct ScrapeCommand {
    /// The URL of the page to scrape
    #[arg(required = true)]
    pub url: String,

    /// Output directory for the mirrored page(s)
    #[arg(short, long, default_value = "downloaded_site")]
    pub output: PathBuf,

    /// Delay between asset downloads, in seconds
    #[arg(short, long, default_value_t = 0.5)]
    pub delay: f64,

    /// Wait for dynamic content to settle, in seconds
    #[arg(short, long, default_value_t = 2.0)]
    pub wait: f64,

    /// Crawl same-domain links instead of scraping a single page
    #[arg(short, long)]
    pub crawl: bool,

    /// Maximum number of pages to crawl
    #[arg(short, long, default_value_t = 10)]
    pub max_pages: usize,

    /// User agent for both the HTTP client and the browser session
    #[arg(short, long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Timeout for direct HTTP requests, in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_args() {
        let args = ScrapeCommand::try_parse_from(&["sitesnap", "https://example.com"]).unwrap();

        assert_eq!(args.url, "https://example.com");
        assert_eq!(args.output, PathBuf::from("downloaded_site"));
        assert_eq!(args.delay, 0.5);
        assert_eq!(args.wait, 2.0);
        assert_eq!(args.crawl, false);
        assert_eq!(args.max_pages, 10);
        assert_eq!(args.timeout, 10);
        assert!(args.user_agent.contains("Mozilla/5.0"));
    }

    #[test]
    fn test_parse_all_args() {
        let args = ScrapeCommand::try_parse_from(&[
            "sitesnap",
            "https://example.com",
            "-o",
            "./site",
            "-d",
            "1.5",
            "-w",
            "4.0",
            "--crawl",
            "-m",
            "25",
            "-u",
            "sitesnap-tests/1.0",
            "--timeout",
            "30",
        ])
        .unwrap();

        assert_eq!(args.output, PathBuf::from("./site"));
        assert_eq!(args.delay, 1.5);
        assert_eq!(args.wait, 4.0);
        assert!(args.crawl);
        assert_eq!(args.max_pages, 25);
        assert_eq!(args.user_agent, "sitesnap-tests/1.0");
        assert_eq!(args.timeout, 30);
    }

    #[test]
    fn test_parse_missing_url() {
        let result = ScrapeCommand::try_parse_from(&["sitesnap", "-o", "./site"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_short_flags() {
        let args =
            ScrapeCommand::try_parse_from(&["sitesnap", "https://example.com", "-c", "-m", "3"])
                .unwrap();
        assert!(args.crawl);
        assert_eq!(args.max_pages, 3);
    }
}
