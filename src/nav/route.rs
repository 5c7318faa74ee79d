use std::borrow::Cow;

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use regex::Regex;

use crate::domain::EntityId;

use super::error::RouteError;

/// Characters escaped when the base name is written into a path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

pub const EDIT_ACTION: &str = "edit";

/// Maps a record identity to and from the view's URL.
pub trait NavigationBridge {
    /// Canonical URL of the view for `id`; `None` is the new-record URL.
    fn encode(&self, id: Option<EntityId>) -> String;

    fn decode(&self, url: &str) -> Result<Option<EntityId>, RouteError>;
}

/// `/<base>/:id?/:action?(edit)`, also reachable through the root alias
/// `/:id?/:action?(edit)`.
#[derive(Debug, Clone)]
pub struct RouteTemplate {
    base: String,
    pattern: Regex,
}

impl RouteTemplate {
    pub const DEFAULT_BASE: &'static str = "master-detail";

    pub fn new(base: &str) -> Result<Self, RouteError> {
        let base = utf8_percent_encode(base.trim_matches('/'), SEGMENT).to_string();
        let prefix = if base.is_empty() {
            String::new()
        } else {
            format!("(?:/{})?", regex::escape(&base))
        };
        let pattern = Regex::new(&format!(
            r"^{prefix}(?:/(?P<id>[^/]+))?(?:/(?P<action>[^/]+))?/?$"
        ))
        .map_err(|err| RouteError::Template(err.to_string()))?;
        Ok(Self { base, pattern })
    }

    /// The `master-detail` route used by the person view.
    pub fn master_detail() -> Result<Self, RouteError> {
        Self::new(Self::DEFAULT_BASE)
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn base_url(&self) -> String {
        if self.base.is_empty() {
            "/".to_string()
        } else {
            format!("/{}", self.base)
        }
    }
}

impl NavigationBridge for RouteTemplate {
    fn encode(&self, id: Option<EntityId>) -> String {
        match id {
            Some(id) => format!("{}/{id}/{EDIT_ACTION}", self.base_url().trim_end_matches('/')),
            None => self.base_url(),
        }
    }

    fn decode(&self, url: &str) -> Result<Option<EntityId>, RouteError> {
        let path = strip_query(url);
        let path = if path.starts_with('/') {
            Cow::Borrowed(path)
        } else {
            Cow::Owned(format!("/{path}"))
        };
        let captures = self
            .pattern
            .captures(&path)
            .ok_or_else(|| RouteError::NoMatch(url.to_string()))?;
        if let Some(action) = captures.name("action") {
            if action.as_str() != EDIT_ACTION {
                return Err(RouteError::UnknownAction(action.as_str().to_string()));
            }
        }
        let Some(segment) = captures.name("id") else {
            return Ok(None);
        };
        let raw = percent_decode_str(segment.as_str()).decode_utf8_lossy();
        raw.parse::<EntityId>()
            .map(Some)
            .map_err(|_| RouteError::InvalidId(raw.into_owned()))
    }
}

fn strip_query(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}
