pub(crate) const READY_STATUS: &str = "Ready. Enter opens a row, Ctrl+N starts a new record.";

#[derive(Debug, Clone)]
pub(crate) struct StatusLine {
    message: String,
}

impl Default for StatusLine {
    fn default() -> Self {
        Self {
            message: READY_STATUS.to_string(),
        }
    }
}

impl StatusLine {
    pub(crate) fn set(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    pub(crate) fn ready(&mut self) {
        self.message = READY_STATUS.to_string();
    }

    pub(crate) fn editing(&mut self, label: &str) {
        self.message = format!("Editing {label}");
    }

    pub(crate) fn pending_exit(&mut self) {
        self.message = "Unsaved changes. Press Ctrl+Q again to quit without saving.".to_string();
    }

    pub(crate) fn message(&self) -> &str {
        &self.message
    }
}
