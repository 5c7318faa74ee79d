use std::{path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::io::{DocumentFormat, decode_document, load_document};

/// When field errors are projected onto the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationMode {
    /// After every edit.
    #[default]
    Eager,
    /// Only when a save is attempted.
    OnSubmit,
}

/// Feature switches of the master-detail view plus terminal knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewOptions {
    /// Mirror the edited record's id into the URL.
    pub deep_linking: bool,
    pub validation: ValidationMode,
    /// Let the user hide and show grid columns.
    pub column_menu: bool,
    pub page_size: usize,
    /// Ask before quitting with unsaved edits.
    pub confirm_exit: bool,
    pub show_help: bool,
    pub tick_rate_ms: u64,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            deep_linking: true,
            validation: ValidationMode::Eager,
            column_menu: false,
            page_size: 50,
            confirm_exit: true,
            show_help: true,
            tick_rate_ms: 250,
        }
    }
}

impl ViewOptions {
    pub fn with_deep_linking(mut self, enabled: bool) -> Self {
        self.deep_linking = enabled;
        self
    }

    pub fn with_validation(mut self, mode: ValidationMode) -> Self {
        self.validation = mode;
        self
    }

    pub fn with_column_menu(mut self, enabled: bool) -> Self {
        self.column_menu = enabled;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_confirm_exit(mut self, confirm: bool) -> Self {
        self.confirm_exit = confirm;
        self
    }

    pub fn with_help(mut self, show: bool) -> Self {
        self.show_help = show;
        self
    }

    pub fn with_tick_rate(mut self, tick_rate: Duration) -> Self {
        self.tick_rate_ms = u64::try_from(tick_rate.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms)
    }

    pub fn from_document(contents: &str, format: DocumentFormat) -> Result<Self> {
        let options: Self =
            decode_document(contents, format).context("invalid view options document")?;
        Ok(options.normalized())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let options: Self = load_document(path)
            .with_context(|| format!("invalid view options in {}", path.display()))?;
        Ok(options.normalized())
    }

    fn normalized(self) -> Self {
        let page_size = self.page_size;
        self.with_page_size(page_size)
    }
}
