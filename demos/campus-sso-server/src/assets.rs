//! Front-end bundle lookup through the Vite build manifest.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolves page entries to their compiled bundles under a build directory.
#[derive(Debug, Clone)]
pub struct AssetManifest {
    build_dir: PathBuf,
}

impl AssetManifest {
    pub fn new(build_dir: impl Into<PathBuf>) -> Self {
        Self {
            build_dir: build_dir.into(),
        }
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.build_dir.join(".vite").join("manifest.json")
    }

    /// Bundle path for `entry`, relative to the build directory.
    ///
    /// Falls back to `assets/{entry}.js` when the manifest is missing,
    /// unreadable or has no record for the entry. The manifest is read on
    /// every call so a rebuilt front end is picked up without a restart.
    pub async fn asset_path(&self, entry: &str) -> String {
        match self.lookup(entry).await {
            Ok(file) => file,
            Err(e) => {
                debug!("Using fallback asset path for '{}': {:#}", entry, e);
                format!("assets/{}.js", entry)
            }
        }
    }

    async fn lookup(&self, entry: &str) -> Result<String> {
        let path = self.manifest_path();
        let raw = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let manifest: Value = serde_json::from_str(&raw).context("Invalid manifest JSON")?;

        let key = format!("src/{}/main.jsx", entry);
        manifest
            .get(&key)
            .and_then(|record| record.get("file"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .with_context(|| format!("No manifest record for {}", key))
    }
}
