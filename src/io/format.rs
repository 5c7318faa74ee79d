use std::{fmt, path::Path};

use anyhow::{Result, bail};

/// Supported formats for snapshots and option files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    #[cfg(feature = "yaml")]
    Yaml,
    #[cfg(feature = "toml")]
    Toml,
}

impl DocumentFormat {
    /// Pick a format from a file extension; files without one are JSON.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            None | Some("json") => Ok(DocumentFormat::Json),
            #[cfg(feature = "yaml")]
            Some("yaml") | Some("yml") => Ok(DocumentFormat::Yaml),
            #[cfg(feature = "toml")]
            Some("toml") => Ok(DocumentFormat::Toml),
            Some(other) => bail!(
                "unsupported document extension '.{other}' for {}",
                path.display()
            ),
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFormat::Json => write!(f, "json"),
            #[cfg(feature = "yaml")]
            DocumentFormat::Yaml => write!(f, "yaml"),
            #[cfg(feature = "toml")]
            DocumentFormat::Toml => write!(f, "toml"),
        }
    }
}
