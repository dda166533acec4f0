use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use url::Url;

/// Storage bucket for a downloaded asset, named after the directory it
/// lands in under the output root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetCategory {
    Css,
    Js,
    Images,
    Assets,
}

/// Extension-to-category table. Anything not listed falls into the
/// catch-all `Assets` bucket, so categorization is total.
const CATEGORY_TABLE: &[(&str, AssetCategory)] = &[
    ("css", AssetCategory::Css),
    ("js", AssetCategory::Js),
    ("png", AssetCategory::Images),
    ("jpg", AssetCategory::Images),
    ("jpeg", AssetCategory::Images),
    ("gif", AssetCategory::Images),
    ("svg", AssetCategory::Images),
    ("webp", AssetCategory::Images),
    ("ico", AssetCategory::Images),
];

impl AssetCategory {
    /// Directory name under the output root.
    pub fn dir_name(self) -> &'static str {
        match self {
            AssetCategory::Css => "css",
            AssetCategory::Js => "js",
            AssetCategory::Images => "images",
            AssetCategory::Assets => "assets",
        }
    }

    /// Categorize by file extension, case-insensitive.
    pub fn from_path(path: &str) -> Self {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        CATEGORY_TABLE
            .iter()
            .find(|(known, _)| *known == ext)
            .map(|(_, category)| *category)
            .unwrap_or(AssetCategory::Assets)
    }
}

/// A discovered reference resolved to its canonical form and the local
/// file it will be stored as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub category: AssetCategory,
    /// Absolute URL with the fragment stripped; the dedup and lookup key.
    pub canonical_url: Url,
    /// `<output_root>/<category>/<normalized URL path>`.
    pub local_path: PathBuf,
}

/// Resolve a reference as it appeared in the page against the page's own
/// URL. Relative references are joined per standard URL resolution;
/// absolute ones pass through. The result is deterministic: the same
/// inputs always produce the same local path.
pub fn resolve(reference: &str, page_url: &Url, output_root: &Path) -> Result<ResolvedAsset> {
    let mut canonical = page_url
        .join(reference)
        .with_context(|| format!("unresolvable asset reference: {}", reference))?;
    canonical.set_fragment(None);

    let mut relative = normalize_url_path(canonical.path());
    if relative.is_empty() {
        relative = "index.html".to_string();
    }

    let category = AssetCategory::from_path(&relative);
    let mut local_path = output_root.join(category.dir_name());
    local_path.extend(relative.split('/'));

    Ok(ResolvedAsset {
        category,
        canonical_url: canonical,
        local_path,
    })
}

/// Resolve a batch of references, deduplicating by canonical URL. A
/// reference that fails to resolve is dropped from the batch, never
/// aborting it.
pub fn resolve_all(
    references: &HashSet<String>,
    page_url: &Url,
    output_root: &Path,
) -> Vec<ResolvedAsset> {
    let mut unique: HashMap<Url, ResolvedAsset> = HashMap::new();
    for reference in references {
        if let Ok(asset) = resolve(reference, page_url, output_root) {
            unique.insert(asset.canonical_url.clone(), asset);
        }
    }
    unique.into_values().collect()
}

/// Collapse redundant segments and strip the leading separator so the URL
/// path can be used as a relative filesystem path.
fn normalize_url_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Url {
        Url::parse("https://example.com/blog/post/").unwrap()
    }

    #[test]
    fn test_categories_are_case_insensitive() {
        assert_eq!(AssetCategory::from_path("style.CSS"), AssetCategory::Css);
        assert_eq!(AssetCategory::from_path("photo.PNG"), AssetCategory::Images);
        assert_eq!(AssetCategory::from_path("app.Js"), AssetCategory::Js);
    }

    #[test]
    fn test_unknown_extensions_fall_back_to_assets() {
        assert_eq!(AssetCategory::from_path("data.bin"), AssetCategory::Assets);
        assert_eq!(AssetCategory::from_path("font.woff2"), AssetCategory::Assets);
        assert_eq!(AssetCategory::from_path("no_extension"), AssetCategory::Assets);
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let root = Path::new("out");
        let first = resolve("../img/logo.png", &page(), root).unwrap();
        let second = resolve("../img/logo.png", &page(), root).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_resolve_relative_reference() {
        let asset = resolve("style.css", &page(), Path::new("out")).unwrap();
        assert_eq!(
            asset.canonical_url.as_str(),
            "https://example.com/blog/post/style.css"
        );
        assert_eq!(asset.category, AssetCategory::Css);
        assert_eq!(asset.local_path, Path::new("out/css/blog/post/style.css"));
    }

    #[test]
    fn test_resolve_strips_fragment() {
        let asset = resolve("https://example.com/pic.png#top", &page(), Path::new("out")).unwrap();
        assert_eq!(asset.canonical_url.as_str(), "https://example.com/pic.png");
        let plain = resolve("https://example.com/pic.png", &page(), Path::new("out")).unwrap();
        assert_eq!(asset.local_path, plain.local_path);
    }

    #[test]
    fn test_resolve_protocol_relative_reference() {
        let asset = resolve("//cdn.example.com/app.js", &page(), Path::new("out")).unwrap();
        assert_eq!(asset.canonical_url.as_str(), "https://cdn.example.com/app.js");
        assert_eq!(asset.category, AssetCategory::Js);
    }

    #[test]
    fn test_resolve_collapses_parent_segments() {
        let asset = resolve("../../theme.css", &page(), Path::new("out")).unwrap();
        assert_eq!(asset.canonical_url.as_str(), "https://example.com/theme.css");
        assert_eq!(asset.local_path, Path::new("out/css/theme.css"));
    }

    #[test]
    fn test_resolve_all_dedups_by_canonical_url() {
        let references: HashSet<String> = [
            "style.css".to_string(),
            "https://example.com/blog/post/style.css".to_string(),
            "app.js".to_string(),
        ]
        .into();
        let assets = resolve_all(&references, &page(), Path::new("out"));
        assert_eq!(assets.len(), 2);
    }

    #[test]
    fn test_normalize_url_path() {
        assert_eq!(normalize_url_path("/a/b/../c//d/./e"), "a/c/d/e");
        assert_eq!(normalize_url_path("/"), "");
    }
}
