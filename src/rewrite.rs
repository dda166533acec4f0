use select::document::Document;
use select::predicate::Name;
use std::path::Path;
use url::Url;

use crate::downloader::DownloadOutcome;

/// Attributes rewritten to local copies: (tag, attribute). Hyperlinks are
/// included so crawled pages that were downloaded as assets resolve
/// locally too.
const REWRITE_SHAPES: &[(&str, &str)] = &[
    ("img", "src"),
    ("script", "src"),
    ("link", "href"),
    ("a", "href"),
];

/// Point every reference with a downloaded copy at its local path,
/// expressed relative to the output root with forward-slash separators.
/// References without an entry in the outcome keep their original value
/// byte for byte.
pub fn rewrite_html(
    html: &str,
    outcome: &DownloadOutcome,
    page_url: &Url,
    output_root: &Path,
) -> String {
    let document = Document::from(html);
    let mut rewritten = html.to_string();

    for (tag, attr) in REWRITE_SHAPES {
        for node in document.find(Name(*tag)) {
            let Some(value) = node.attr(attr) else {
                continue;
            };
            let Some(local) = local_target(value, outcome, page_url, output_root) else {
                continue;
            };
            rewritten = rewritten.replace(
                &format!("{}=\"{}\"", attr, value),
                &format!("{}=\"{}\"", attr, local),
            );
        }
    }

    rewritten
}

/// The outcome's path for this reference, if its canonical form was
/// downloaded.
fn local_target(
    value: &str,
    outcome: &DownloadOutcome,
    page_url: &Url,
    output_root: &Path,
) -> Option<String> {
    let mut canonical = page_url.join(value).ok()?;
    canonical.set_fragment(None);

    let local = outcome.local_path(&canonical)?;
    let relative = pathdiff::diff_paths(local, output_root)?;

    Some(
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/"),
    )
}
