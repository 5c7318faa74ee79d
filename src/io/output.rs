use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Serialize;

use super::DocumentFormat;

/// Where an exported document is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputDestination {
    Stdout,
    File(PathBuf),
}

impl OutputDestination {
    pub fn file(path: impl AsRef<Path>) -> Self {
        OutputDestination::File(path.as_ref().to_path_buf())
    }

    /// `-` means stdout; anything else is a file path.
    pub fn parse(raw: &str) -> Self {
        if raw == "-" {
            OutputDestination::Stdout
        } else {
            OutputDestination::file(raw)
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format: DocumentFormat,
    pub pretty: bool,
    pub destinations: Vec<OutputDestination>,
}

impl OutputOptions {
    pub fn new(format: DocumentFormat) -> Self {
        Self {
            format,
            pretty: true,
            destinations: Vec::new(),
        }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn add_destination(mut self, destination: OutputDestination) -> Self {
        self.destinations.push(destination);
        self
    }
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self::new(DocumentFormat::Json)
    }
}

/// Serialize `value` once and write it to every configured destination.
pub fn emit<T: Serialize + ?Sized>(value: &T, options: &OutputOptions) -> Result<()> {
    if options.destinations.is_empty() {
        return Ok(());
    }
    let payload = render(value, options)?;
    for destination in &options.destinations {
        match destination {
            OutputDestination::Stdout => write_stdout(&payload).context("failed to write to stdout")?,
            OutputDestination::File(path) => write_file(path, &payload)
                .with_context(|| format!("failed to write {}", path.display()))?,
        }
    }
    Ok(())
}

fn render<T: Serialize + ?Sized>(value: &T, options: &OutputOptions) -> Result<String> {
    let text = match options.format {
        DocumentFormat::Json if options.pretty => serde_json::to_string_pretty(value)?,
        DocumentFormat::Json => serde_json::to_string(value)?,
        #[cfg(feature = "yaml")]
        DocumentFormat::Yaml => serde_yaml::to_string(value)?,
        #[cfg(feature = "toml")]
        DocumentFormat::Toml if options.pretty => toml::to_string_pretty(value)?,
        #[cfg(feature = "toml")]
        DocumentFormat::Toml => toml::to_string(value)?,
    };
    Ok(text)
}

fn write_stdout(payload: &str) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{payload}")?;
    stdout.flush()
}

/// Write next to the target and rename over it so readers never see a
/// half-written snapshot.
fn write_file(path: &Path, payload: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let staging = path.with_extension("partial");
    fs::write(&staging, format!("{payload}\n"))?;
    fs::rename(&staging, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn scratch_path(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir()
            .join(format!("masterdetail-{name}-{nanos}"))
            .join("people.json")
    }

    #[test]
    fn no_destinations_is_a_noop() {
        emit(&json!({"rows": []}), &OutputOptions::default()).unwrap();
    }

    #[test]
    fn file_destination_creates_parent_directories() {
        let path = scratch_path("emit");
        let options = OutputOptions::new(DocumentFormat::Json)
            .with_pretty(false)
            .add_destination(OutputDestination::file(&path));
        emit(&json!({"nextId": 3, "rows": []}), &options).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written.trim(), r#"{"nextId":3,"rows":[]}"#);
        assert!(!path.with_extension("partial").exists());
        fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn dash_means_stdout() {
        assert_eq!(OutputDestination::parse("-"), OutputDestination::Stdout);
        assert_eq!(
            OutputDestination::parse("out.json"),
            OutputDestination::file("out.json")
        );
    }
}
