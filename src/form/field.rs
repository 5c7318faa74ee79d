use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde_json::Value;

use crate::domain::{FieldKind, FieldSchema};

use super::{
    convert::{date_value, string_value, value_to_string},
    error::{BindError, FieldCoercionError},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Bool(bool),
}

/// A value supplied by the user for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldInput {
    Text(String),
    Bool(bool),
}

impl From<&str> for FieldInput {
    fn from(value: &str) -> Self {
        FieldInput::Text(value.to_string())
    }
}

impl From<String> for FieldInput {
    fn from(value: String) -> Self {
        FieldInput::Text(value)
    }
}

impl From<bool> for FieldInput {
    fn from(value: bool) -> Self {
        FieldInput::Bool(value)
    }
}

#[derive(Debug, Clone)]
pub struct FieldState {
    pub schema: FieldSchema,
    pub value: FieldValue,
    /// Set by user edits only; programmatic seeding leaves it untouched.
    pub dirty: bool,
    pub error: Option<String>,
}

impl FieldState {
    pub fn from_schema(schema: FieldSchema) -> Self {
        let value = match schema.kind {
            FieldKind::Text | FieldKind::Date => FieldValue::Text(String::new()),
            FieldKind::Boolean => FieldValue::Bool(false),
        };
        FieldState {
            schema,
            value,
            dirty: false,
            error: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }

    pub fn seed_value(&mut self, value: &Value) {
        match &mut self.value {
            FieldValue::Text(buffer) => *buffer = value_to_string(value),
            FieldValue::Bool(flag) => *flag = value.as_bool().unwrap_or(false),
        }
        self.dirty = false;
        self.error = None;
    }

    pub fn assign(&mut self, input: FieldInput) -> Result<(), BindError> {
        match (&mut self.value, input) {
            (FieldValue::Text(buffer), FieldInput::Text(text)) => *buffer = text,
            (FieldValue::Bool(flag), FieldInput::Bool(value)) => *flag = value,
            (_, FieldInput::Text(_)) => return Err(self.mismatch("text")),
            (_, FieldInput::Bool(_)) => return Err(self.mismatch("boolean")),
        }
        self.after_edit();
        Ok(())
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        let changed = match &mut self.value {
            FieldValue::Text(buffer) => match key.code {
                KeyCode::Char(ch) => {
                    if key.modifiers.contains(KeyModifiers::CONTROL) {
                        return false;
                    }
                    buffer.push(ch);
                    true
                }
                KeyCode::Backspace => buffer.pop().is_some(),
                KeyCode::Delete => {
                    let had_text = !buffer.is_empty();
                    buffer.clear();
                    had_text
                }
                _ => false,
            },
            FieldValue::Bool(value) => match key.code {
                KeyCode::Char(' ') | KeyCode::Left | KeyCode::Right => {
                    *value = !*value;
                    true
                }
                _ => false,
            },
        };
        if changed {
            self.after_edit();
        }
        changed
    }

    pub fn display_value(&self) -> String {
        match &self.value {
            FieldValue::Text(text) => text.clone(),
            FieldValue::Bool(true) => "[x]".to_string(),
            FieldValue::Bool(false) => "[ ]".to_string(),
        }
    }

    pub fn current_value(&self) -> Result<Option<Value>, FieldCoercionError> {
        match (&self.schema.kind, &self.value) {
            (FieldKind::Text, FieldValue::Text(text)) => string_value(text, &self.schema),
            (FieldKind::Date, FieldValue::Text(text)) => date_value(text, &self.schema),
            (FieldKind::Boolean, FieldValue::Bool(value)) => Ok(Some(Value::Bool(*value))),
            _ => Err(FieldCoercionError {
                pointer: self.schema.pointer.clone(),
                message: "field value does not match its kind".to_string(),
            }),
        }
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn set_error(&mut self, message: String) {
        self.error = Some(message);
    }

    fn after_edit(&mut self) {
        self.dirty = true;
        self.error = None;
    }

    fn mismatch(&self, given: &'static str) -> BindError {
        BindError::KindMismatch {
            field: self.schema.name.clone(),
            given,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(kind: FieldKind) -> FieldState {
        FieldState::from_schema(FieldSchema {
            name: "name".to_string(),
            pointer: "/name".to_string(),
            title: "Name".to_string(),
            description: None,
            kind,
            required: false,
        })
    }

    #[test]
    fn seeding_does_not_mark_dirty() {
        let mut state = field(FieldKind::Text);
        state.seed_value(&Value::String("Ada".into()));
        assert_eq!(state.display_value(), "Ada");
        assert!(!state.dirty);
    }

    #[test]
    fn typing_marks_dirty_and_clears_error() {
        let mut state = field(FieldKind::Text);
        state.set_error("bad".into());
        assert!(state.handle_key(&KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT)));
        assert!(state.dirty);
        assert!(state.error.is_none());
        assert_eq!(state.display_value(), "A");
    }

    #[test]
    fn control_chords_and_empty_backspace_are_ignored() {
        let mut state = field(FieldKind::Text);
        let ctrl_a = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::CONTROL);
        assert!(!state.handle_key(&ctrl_a));
        assert!(!state.handle_key(&KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE)));
        assert!(!state.dirty);
    }

    #[test]
    fn space_toggles_booleans() {
        let mut state = field(FieldKind::Boolean);
        assert!(state.handle_key(&KeyEvent::new(KeyCode::Char(' '), KeyModifiers::NONE)));
        assert_eq!(state.value, FieldValue::Bool(true));
        assert_eq!(state.current_value().unwrap(), Some(Value::Bool(true)));
    }

    #[test]
    fn assign_rejects_wrong_input_kind() {
        let mut state = field(FieldKind::Boolean);
        let err = state.assign(FieldInput::from("yes")).unwrap_err();
        assert!(matches!(err, BindError::KindMismatch { given: "text", .. }));
        assert!(!state.dirty);
    }
}
