use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{EnableParams, EventRequestWillBeSent};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use url::Url;

/// One headless Chromium session, scoped to a single navigation.
///
/// Every network request the page issues is recorded from the moment the
/// session is launched. Callers own the lifecycle: launch, navigate, read
/// what they need, then [`BrowserSession::close`] on every exit path.
pub struct BrowserSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    collector: JoinHandle<()>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl BrowserSession {
    /// Launch headless Chromium with network capture enabled on a blank
    /// page.
    pub async fn launch(user_agent: &str) -> Result<Self> {
        let config = BrowserConfig::builder()
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg(format!("--user-agent={}", user_agent))
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {}", e))?;

        let (mut browser, mut events) = Browser::launch(config)
            .await
            .context("failed to launch headless browser")?;

        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                let _ = event;
            }
        });

        match Self::open_traced_page(&browser).await {
            Ok((page, collector, requests)) => Ok(Self {
                browser,
                page,
                handler,
                collector,
                requests,
            }),
            Err(e) => {
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler.abort();
                Err(e)
            }
        }
    }

    async fn open_traced_page(
        browser: &Browser,
    ) -> Result<(Page, JoinHandle<()>, Arc<Mutex<Vec<String>>>)> {
        let page = browser
            .new_page("about:blank")
            .await
            .context("failed to open browser page")?;

        if let Err(e) = page.execute(EnableParams::default()).await {
            eprintln!("warning: failed to enable network domain: {}", e);
        }

        let requests = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&requests);
        let mut listener = page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .context("failed to attach network listener")?;
        let collector = tokio::spawn(async move {
            while let Some(event) = listener.next().await {
                sink.lock().unwrap().push(event.request.url.clone());
            }
        });

        Ok((page, collector, requests))
    }

    /// Navigate and let asynchronous activity settle before the caller
    /// reads the trace or the rendered source.
    pub async fn goto(&self, url: &Url, settle: Duration) -> Result<()> {
        self.page
            .goto(url.as_str())
            .await
            .with_context(|| format!("navigation to {} failed", url))?;
        tokio::time::sleep(settle).await;
        Ok(())
    }

    /// Every network request URL captured so far.
    pub fn captured_requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// The fully rendered document source, after script execution.
    pub async fn rendered_source(&self) -> Result<String> {
        let value = self
            .page
            .evaluate("document.documentElement.outerHTML")
            .await
            .context("failed to read rendered document")?;

        value
            .into_value()
            .map_err(|e| anyhow::anyhow!("unexpected rendered document value: {:?}", e))
    }

    /// Tear the session down. Failures during teardown are not
    /// actionable and are ignored.
    pub async fn close(mut self) {
        self.collector.abort();
        let _ = self.page.close().await;
        let _ = self.browser.close().await;
        let _ = self.browser.wait().await;
        self.handler.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn test_session_captures_requests_and_renders() {
        let session = BrowserSession::launch("sitesnap-test").await.unwrap();
        let url = Url::parse("data:text/html,<h1>Hello</h1>").unwrap();

        session.goto(&url, Duration::from_millis(200)).await.unwrap();
        let html = session.rendered_source().await.unwrap();
        session.close().await;

        assert!(html.contains("<h1>Hello</h1>"));
    }
}
