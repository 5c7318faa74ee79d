/// The session's address bar, injected into the controller.
pub trait History {
    /// Replace the current entry without adding a new one.
    fn replace_state(&mut self, url: &str);

    fn current(&self) -> &str;
}

/// In-process history holding a single entry.
///
/// Every replacement that changed the URL is also appended to
/// `replacements`, so callers can see which addresses the session went
/// through.
#[derive(Debug, Clone)]
pub struct SessionHistory {
    current: String,
    replacements: Vec<String>,
}

impl Default for SessionHistory {
    fn default() -> Self {
        Self::new("/")
    }
}

impl SessionHistory {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            current: initial.into(),
            replacements: Vec::new(),
        }
    }

    pub fn replacements(&self) -> &[String] {
        &self.replacements
    }
}

impl History for SessionHistory {
    fn replace_state(&mut self, url: &str) {
        if self.current != url {
            url.clone_into(&mut self.current);
            self.replacements.push(url.to_string());
        }
    }

    fn current(&self) -> &str {
        &self.current
    }
}
