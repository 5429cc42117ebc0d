//! Page chrome: the sidebar logo

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;
use tracing::info;

/// Logo image embedded as a data URI
#[derive(Debug, Clone)]
pub struct Logo {
    data_uri: String,
}

impl Logo {
    /// Read and encode the logo. A missing or empty file is a startup error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read logo at {}", path.display()))?;
        if bytes.is_empty() {
            anyhow::bail!("logo at {} is empty", path.display());
        }

        let logo = Self::from_bytes(&image_subtype(path), &bytes);
        info!("Logo loaded: {} ({} bytes)", path.display(), bytes.len());
        Ok(logo)
    }

    pub fn from_bytes(subtype: &str, bytes: &[u8]) -> Self {
        Self {
            data_uri: format!("data:image/{};base64,{}", subtype, STANDARD.encode(bytes)),
        }
    }

    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }
}

/// Lowercased text after the last dot of the file name
fn image_subtype(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.rsplit('.').next().unwrap_or_default().to_lowercase()
}
