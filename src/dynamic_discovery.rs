use anyhow::Result;
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

use crate::browser::BrowserSession;

/// Extensions that mark a traced request as an asset worth mirroring.
/// This is an allowlist over the network trace, not a categorizer; XHR
/// calls and document navigations fall through and are discarded.
const TRACE_EXTENSIONS: &[&str] = &[
    ".css", ".js", ".png", ".jpg", ".jpeg", ".woff", ".woff2", ".svg", ".json",
];

/// Drive a rendered browser session against the page and collect the
/// asset requests it issued, including ones triggered by scripts after
/// load. The session is torn down on every path, navigation failure
/// included.
pub async fn discover(page_url: &Url, settle: Duration, user_agent: &str) -> Result<HashSet<String>> {
    let session = BrowserSession::launch(user_agent).await?;
    let navigation = session.goto(page_url, settle).await;
    let captured = session.captured_requests();
    session.close().await;
    navigation?;

    Ok(captured
        .into_iter()
        .filter(|request| is_asset_request(request))
        .collect())
}

/// True when the request's path ends in a recognized asset extension.
pub fn is_asset_request(url: &str) -> bool {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_ascii_lowercase(),
        Err(_) => url.to_ascii_lowercase(),
    };
    TRACE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_extensions_pass_the_filter() {
        assert!(is_asset_request("https://example.com/theme.css"));
        assert!(is_asset_request("https://example.com/app.JS"));
        assert!(is_asset_request("https://cdn.example.com/fonts/inter.woff2"));
        assert!(is_asset_request("https://example.com/data/config.json"));
    }

    #[test]
    fn test_navigations_and_api_calls_are_discarded() {
        assert!(!is_asset_request("https://example.com/"));
        assert!(!is_asset_request("https://example.com/page.html"));
        assert!(!is_asset_request("https://example.com/api/v1/users"));
    }

    #[test]
    fn test_query_strings_do_not_defeat_the_filter() {
        assert!(is_asset_request("https://example.com/app.js?v=12"));
        assert!(!is_asset_request("https://example.com/search?q=style.css"));
    }
}
