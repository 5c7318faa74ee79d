use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

use super::DocumentFormat;

/// Deserialize a document written in `format` straight into `T`.
pub fn decode_document<T: DeserializeOwned>(contents: &str, format: DocumentFormat) -> Result<T> {
    let decoded = match format {
        DocumentFormat::Json => serde_json::from_str(contents).map_err(anyhow::Error::from),
        #[cfg(feature = "yaml")]
        DocumentFormat::Yaml => serde_yaml::from_str(contents).map_err(anyhow::Error::from),
        #[cfg(feature = "toml")]
        DocumentFormat::Toml => toml::from_str(contents).map_err(anyhow::Error::from),
    };
    decoded.with_context(|| format!("malformed {format} document"))
}

/// Read and decode a file, picking the format from its extension.
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let format = DocumentFormat::from_path(path)?;
    let contents =
        fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    decode_document(&contents, format).with_context(|| format!("cannot load {}", path.display()))
}
