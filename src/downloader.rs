use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::http::Transport;
use crate::locator::ResolvedAsset;
use crate::storage::FileStore;

/// Successfully materialized assets, keyed by canonical URL.
///
/// Only successes appear in the map: the rewrite pass consults it and
/// leaves any reference without an entry untouched, so a failed download
/// never turns into a dangling local path.
#[derive(Debug, Default)]
pub struct DownloadOutcome {
    completed: HashMap<Url, PathBuf>,
    failed: Vec<Url>,
}

impl DownloadOutcome {
    pub fn record(&mut self, url: Url, local_path: PathBuf) {
        self.completed.insert(url, local_path);
    }

    pub fn record_failure(&mut self, url: Url) {
        self.failed.push(url);
    }

    pub fn local_path(&self, url: &Url) -> Option<&PathBuf> {
        self.completed.get(url)
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    pub fn failed(&self) -> &[Url] {
        &self.failed
    }
}

/// Fetch every resolved asset and write it under the store, pausing
/// between successful downloads. One asset's failure never aborts the
/// batch; it is recorded and the loop moves on.
pub async fn download_assets(
    transport: &dyn Transport,
    store: &FileStore,
    assets: &[ResolvedAsset],
    delay: Duration,
) -> DownloadOutcome {
    let mut outcome = DownloadOutcome::default();

    let progress = ProgressBar::new(assets.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap(),
    );

    for asset in assets {
        progress.set_message(asset.canonical_url.to_string());

        match transport.get_bytes(&asset.canonical_url).await {
            Ok(body) => match store.write(&asset.local_path, &body) {
                Ok(()) => {
                    outcome.record(asset.canonical_url.clone(), asset.local_path.clone());
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    eprintln!("{} could not save {}: {:#}", "❌".red(), asset.canonical_url, e);
                    outcome.record_failure(asset.canonical_url.clone());
                }
            },
            Err(e) => {
                eprintln!("{} error downloading {}: {:#}", "❌".red(), asset.canonical_url, e);
                outcome.record_failure(asset.canonical_url.clone());
            }
        }

        progress.inc(1);
    }

    progress.finish_and_clear();
    outcome
}
