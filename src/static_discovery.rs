use colored::*;
use regex::Regex;
use select::document::Document;
use select::predicate::Name;
use std::collections::HashSet;
use url::Url;

use crate::http::Transport;

/// Reference shapes scanned in markup: (tag, attribute).
const MARKUP_SHAPES: &[(&str, &str)] = &[("link", "href"), ("script", "src"), ("img", "src")];

/// Inline-data and executable-script pseudo-URLs are not fetchable assets.
fn is_pseudo_url(value: &str) -> bool {
    value.starts_with("data:") || value.starts_with("javascript:")
}

/// Collect asset references from the parsed page plus its linked
/// stylesheets. References are returned as they appeared in source;
/// resolution against the page URL happens downstream.
pub async fn discover(
    document: &Document,
    page_url: &Url,
    transport: &dyn Transport,
) -> HashSet<String> {
    let mut references = HashSet::new();

    for (tag, attr) in MARKUP_SHAPES {
        for node in document.find(Name(*tag)) {
            if let Some(value) = node.attr(attr) {
                if !value.is_empty() && !is_pseudo_url(value) {
                    references.insert(value.to_string());
                }
            }
        }
    }

    // Stylesheets get a second pass: fetch each one and pull out its
    // url(...) references. A stylesheet that fails to fetch simply
    // contributes nothing.
    for link in document.find(Name("link")) {
        let rel = link.attr("rel").unwrap_or("");
        if !rel.contains("stylesheet") {
            continue;
        }
        let Some(href) = link.attr("href") else {
            continue;
        };
        if href.is_empty() || is_pseudo_url(href) {
            continue;
        }
        let Ok(stylesheet_url) = page_url.join(href) else {
            continue;
        };
        match transport.get_text(&stylesheet_url).await {
            Ok(body) => references.extend(embedded_css_urls(&body)),
            Err(e) => eprintln!(
                "{} stylesheet {} skipped: {:#}",
                "⚠️".yellow(),
                stylesheet_url,
                e
            ),
        }
    }

    references
}

/// url(...) occurrences in a stylesheet body, minus inline-data entries.
pub fn embedded_css_urls(css: &str) -> HashSet<String> {
    let mut urls = HashSet::new();
    if let Ok(pattern) = Regex::new(r#"url\(['"]?([^'")\s]+)['"]?\)"#) {
        for capture in pattern.captures_iter(css) {
            if let Some(reference) = capture.get(1) {
                let value = reference.as_str();
                if !value.is_empty() && !is_pseudo_url(value) {
                    urls.insert(value.to_string());
                }
            }
        }
    }
    urls
}
