use anyhow::{Context, Result, anyhow, bail, ensure};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use indexmap::IndexMap;
use serde::Deserialize;

const BUILTIN: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/keymap/default.keymap.json"
));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyAction {
    Save,
    Quit,
    NewRecord,
    Delete,
    Cancel,
    SwitchFocus,
    FieldStep(i32),
    RowStep(i32),
    PageStep(i32),
    ColumnStep(i32),
    OpenRow,
    SortColumn,
    ColumnMenu,
    Filter,
    ToggleHelp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum KeymapContext {
    Grid,
    Form,
}

impl KeymapContext {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "grid" => Some(KeymapContext::Grid),
            "form" => Some(KeymapContext::Form),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct RawEntry {
    id: String,
    description: String,
    contexts: Vec<String>,
    action: RawAction,
    combos: Vec<String>,
}

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
enum RawAction {
    Save,
    Quit,
    NewRecord,
    Delete,
    Cancel,
    SwitchFocus,
    FieldStep { delta: i32 },
    RowStep { delta: i32 },
    PageStep { delta: i32 },
    ColumnStep { delta: i32 },
    OpenRow,
    SortColumn,
    ColumnMenu,
    Filter,
    ToggleHelp,
}

impl From<RawAction> for KeyAction {
    fn from(raw: RawAction) -> Self {
        match raw {
            RawAction::Save => KeyAction::Save,
            RawAction::Quit => KeyAction::Quit,
            RawAction::NewRecord => KeyAction::NewRecord,
            RawAction::Delete => KeyAction::Delete,
            RawAction::Cancel => KeyAction::Cancel,
            RawAction::SwitchFocus => KeyAction::SwitchFocus,
            RawAction::FieldStep { delta } => KeyAction::FieldStep(delta),
            RawAction::RowStep { delta } => KeyAction::RowStep(delta),
            RawAction::PageStep { delta } => KeyAction::PageStep(delta),
            RawAction::ColumnStep { delta } => KeyAction::ColumnStep(delta),
            RawAction::OpenRow => KeyAction::OpenRow,
            RawAction::SortColumn => KeyAction::SortColumn,
            RawAction::ColumnMenu => KeyAction::ColumnMenu,
            RawAction::Filter => KeyAction::Filter,
            RawAction::ToggleHelp => KeyAction::ToggleHelp,
        }
    }
}

#[derive(Debug, Clone)]
struct KeyBinding {
    action: KeyAction,
    contexts: Vec<KeymapContext>,
    combos: Vec<KeyPattern>,
    snippet: String,
}

impl KeyBinding {
    fn from_raw(raw: RawEntry) -> Result<Self> {
        let contexts = raw
            .contexts
            .iter()
            .map(|ctx| {
                KeymapContext::parse(ctx)
                    .ok_or_else(|| anyhow!("unknown context '{ctx}' in keymap entry {}", raw.id))
            })
            .collect::<Result<Vec<_>>>()?;
        ensure!(
            !contexts.is_empty(),
            "keymap entry {} must declare at least one context",
            raw.id
        );
        let combos = raw
            .combos
            .iter()
            .map(|combo| {
                KeyPattern::parse(combo)
                    .with_context(|| format!("bad combo '{combo}' in keymap entry {}", raw.id))
            })
            .collect::<Result<Vec<_>>>()?;
        ensure!(!combos.is_empty(), "keymap entry {} must declare combos", raw.id);
        let keys = combos
            .iter()
            .map(|pattern| pattern.display.as_str())
            .collect::<Vec<_>>()
            .join("/");
        Ok(Self {
            action: raw.action.into(),
            contexts,
            snippet: format!("{keys} {}", raw.description),
            combos,
        })
    }

    fn matches(&self, context: KeymapContext, key: &KeyEvent) -> bool {
        self.contexts.contains(&context) && self.combos.iter().any(|pattern| pattern.matches(key))
    }
}

#[derive(Debug, Clone)]
struct KeyPattern {
    matcher: CodeMatcher,
    required: KeyModifiers,
    display: String,
}

impl KeyPattern {
    fn parse(combo: &str) -> Result<Self> {
        let display = combo.trim().to_string();
        let mut tokens = display
            .split('+')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .collect::<Vec<_>>();
        let Some(key_token) = tokens.pop() else {
            bail!("combo must name a key");
        };
        let matcher = CodeMatcher::from_token(key_token)?;
        let mut required = KeyModifiers::empty();
        for token in tokens {
            match token.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => required |= KeyModifiers::CONTROL,
                "shift" => required |= KeyModifiers::SHIFT,
                "alt" => required |= KeyModifiers::ALT,
                other => bail!("unsupported modifier '{other}'"),
            }
        }
        Ok(Self {
            matcher,
            required,
            display,
        })
    }

    /// Shift is tolerated on character keys since it is how many of them
    /// are typed.
    fn matches(&self, key: &KeyEvent) -> bool {
        if !self.matcher.matches(&key.code) || !key.modifiers.contains(self.required) {
            return false;
        }
        let mut extra = key.modifiers.difference(self.required);
        if matches!(self.matcher, CodeMatcher::Char(_) | CodeMatcher::Literal(KeyCode::BackTab)) {
            extra.remove(KeyModifiers::SHIFT);
        }
        extra.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
enum CodeMatcher {
    Literal(KeyCode),
    Char(char),
}

impl CodeMatcher {
    fn from_token(token: &str) -> Result<Self> {
        let matcher = match token.to_ascii_lowercase().as_str() {
            "tab" => CodeMatcher::Literal(KeyCode::Tab),
            "backtab" => CodeMatcher::Literal(KeyCode::BackTab),
            "enter" => CodeMatcher::Literal(KeyCode::Enter),
            "esc" | "escape" => CodeMatcher::Literal(KeyCode::Esc),
            "left" => CodeMatcher::Literal(KeyCode::Left),
            "right" => CodeMatcher::Literal(KeyCode::Right),
            "up" => CodeMatcher::Literal(KeyCode::Up),
            "down" => CodeMatcher::Literal(KeyCode::Down),
            "pageup" => CodeMatcher::Literal(KeyCode::PageUp),
            "pagedown" => CodeMatcher::Literal(KeyCode::PageDown),
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => CodeMatcher::Char(ch),
                    _ => bail!("unsupported key '{token}'"),
                }
            }
        };
        Ok(matcher)
    }

    fn matches(&self, code: &KeyCode) -> bool {
        match (self, code) {
            (CodeMatcher::Literal(expected), actual) => actual == expected,
            (CodeMatcher::Char(expected), KeyCode::Char(actual)) => {
                actual.to_ascii_lowercase() == *expected
            }
            _ => false,
        }
    }
}

/// Key bindings in declaration order, keyed by entry id.
#[derive(Debug, Clone)]
pub(crate) struct Keymap {
    bindings: IndexMap<String, KeyBinding>,
}

impl Keymap {
    pub(crate) fn builtin() -> Result<Self> {
        Self::parse(BUILTIN).context("invalid keymap/default.keymap.json")
    }

    pub(crate) fn parse(source: &str) -> Result<Self> {
        let entries: Vec<RawEntry> = serde_json::from_str(source).context("malformed keymap")?;
        let mut bindings = IndexMap::with_capacity(entries.len());
        for entry in entries {
            let id = entry.id.clone();
            let binding = KeyBinding::from_raw(entry)?;
            if bindings.insert(id.clone(), binding).is_some() {
                bail!("keymap entry {id} is declared twice");
            }
        }
        Ok(Self { bindings })
    }

    pub(crate) fn classify(&self, context: KeymapContext, key: &KeyEvent) -> Option<KeyAction> {
        self.bindings
            .values()
            .find(|binding| binding.matches(context, key))
            .map(|binding| binding.action)
    }

    pub(crate) fn help_text(&self, context: KeymapContext) -> String {
        let mut seen = Vec::new();
        self.bindings
            .values()
            .filter(|binding| binding.contexts.contains(&context))
            .filter(|binding| {
                let fresh = !seen.contains(&binding.action);
                seen.push(binding.action);
                fresh
            })
            .map(|binding| binding.snippet.as_str())
            .collect::<Vec<_>>()
            .join(" • ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn builtin_keymap_parses() {
        let keymap = Keymap::builtin().unwrap();
        assert_eq!(
            keymap.classify(KeymapContext::Grid, &key(KeyCode::Char('s'), KeyModifiers::CONTROL)),
            Some(KeyAction::Save)
        );
        assert_eq!(
            keymap.classify(KeymapContext::Grid, &key(KeyCode::Char('s'), KeyModifiers::NONE)),
            Some(KeyAction::SortColumn)
        );
        assert_eq!(
            keymap.classify(KeymapContext::Form, &key(KeyCode::Char('s'), KeyModifiers::NONE)),
            None
        );
        assert_eq!(
            keymap.classify(KeymapContext::Grid, &key(KeyCode::Char('?'), KeyModifiers::SHIFT)),
            Some(KeyAction::ToggleHelp)
        );
    }

    #[test]
    fn context_decides_enter() {
        let keymap = Keymap::builtin().unwrap();
        let enter = key(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(keymap.classify(KeymapContext::Grid, &enter), Some(KeyAction::OpenRow));
        assert_eq!(keymap.classify(KeymapContext::Form, &enter), Some(KeyAction::Save));
    }

    #[test]
    fn help_lists_each_action_once() {
        let keymap = Keymap::builtin().unwrap();
        let help = keymap.help_text(KeymapContext::Form);
        assert_eq!(help.matches("save").count(), 1);
        assert!(help.contains("Esc cancel"));
    }

    #[test]
    fn rejects_duplicates_and_unknown_contexts() {
        let duplicate = r#"[
            {"id": "a", "description": "x", "contexts": ["grid"], "action": {"kind": "save"}, "combos": ["Ctrl+S"]},
            {"id": "a", "description": "y", "contexts": ["grid"], "action": {"kind": "quit"}, "combos": ["Ctrl+Q"]}
        ]"#;
        assert!(Keymap::parse(duplicate).is_err());
        let unknown = r#"[
            {"id": "a", "description": "x", "contexts": ["popup"], "action": {"kind": "save"}, "combos": ["Ctrl+S"]}
        ]"#;
        assert!(Keymap::parse(unknown).is_err());
        let bad_modifier = r#"[
            {"id": "a", "description": "x", "contexts": ["grid"], "action": {"kind": "save"}, "combos": ["Hyper+S"]}
        ]"#;
        assert!(Keymap::parse(bad_modifier).is_err());
    }
}
