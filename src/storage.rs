use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Filesystem sink rooted at the output directory. Directory creation is
/// idempotent and writes overwrite, so re-running a scrape converges on
/// the same tree.
#[derive(Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)
            .with_context(|| format!("failed to create output directory: {:?}", root))?;

        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write content, creating any missing parent directories first.
    pub fn write(&self, path: &Path, content: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {:?}", parent))?;
        }
        fs::write(path, content).with_context(|| format!("failed to write file: {:?}", path))
    }

    /// Persist the rewritten page as index.html under the root.
    pub fn write_page(&self, html: &str) -> Result<PathBuf> {
        let path = self.root.join("index.html");
        self.write(&path, html.as_bytes())?;
        Ok(path)
    }
}
