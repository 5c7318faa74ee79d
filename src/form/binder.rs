use anyhow::{Context, Result};
use crossterm::event::KeyEvent;
use jsonschema::Validator;
use serde_json::{Map, Value};
use tracing::warn;

use crate::domain::{Entity, FormSchema, form_schema_for};

use super::{
    error::{BindError, FieldCoercionError},
    field::{FieldInput, FieldState},
    validation::ValidationOutcome,
};

/// Binds one record instance to the form's input fields.
///
/// Valid edits are written through to the bound record as they happen.
/// `is_valid` and `has_changes` are recomputed from the fields on every call;
/// the binder keeps no separate "changed" flag.
pub struct FormBinder<E: Entity> {
    fields: Vec<FieldState>,
    validator: Validator,
    record: Option<E>,
}

impl<E: Entity> FormBinder<E> {
    pub fn new() -> Result<Self> {
        Self::from_schema(form_schema_for::<E>()?)
    }

    pub fn from_schema(schema: FormSchema) -> Result<Self> {
        let validator = jsonschema::options()
            .should_validate_formats(true)
            .build(&schema.root)
            .with_context(|| format!("failed to compile validation rules for {}", E::LABEL))?;
        let fields = schema
            .fields
            .into_iter()
            .map(FieldState::from_schema)
            .collect();
        Ok(Self {
            fields,
            validator,
            record: None,
        })
    }

    /// Replace the bound record. Fields are seeded programmatically, so the
    /// session starts clean.
    pub fn load(&mut self, record: E) {
        let snapshot = snapshot_of(&record);
        for field in &mut self.fields {
            let value = snapshot.get(field.name()).unwrap_or(&Value::Null);
            field.seed_value(value);
        }
        self.record = Some(record);
    }

    pub fn set_field(&mut self, name: &str, input: impl Into<FieldInput>) -> Result<(), BindError> {
        let index = self.active_index(name)?;
        self.fields[index].assign(input.into())?;
        self.write_through(index);
        Ok(())
    }

    /// Route a terminal key press to a field. Returns whether the value changed.
    pub fn apply_key(&mut self, name: &str, key: &KeyEvent) -> Result<bool, BindError> {
        let index = self.active_index(name)?;
        if !self.fields[index].handle_key(key) {
            return Ok(false);
        }
        self.write_through(index);
        Ok(true)
    }

    pub fn is_valid(&self) -> bool {
        let Ok(value) = self.build_value() else {
            return false;
        };
        self.validator.is_valid(&value) && serde_json::from_value::<E>(value).is_ok()
    }

    pub fn has_changes(&self) -> bool {
        self.record.is_some() && self.fields.iter().any(|field| field.dirty)
    }

    pub fn current_record(&self) -> Option<&E> {
        self.record.as_ref()
    }

    pub fn fields(&self) -> &[FieldState] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldState> {
        self.fields.iter().find(|field| field.name() == name)
    }

    pub fn error_count(&self) -> usize {
        self.fields
            .iter()
            .filter(|field| field.error.is_some())
            .count()
    }

    /// Project every rule failure onto its field for display.
    pub fn validate(&mut self) -> ValidationOutcome {
        match self.build_value() {
            Ok(value) => {
                self.clear_errors();
                if self.validator.is_valid(&value) {
                    return ValidationOutcome::Valid;
                }
                let mut issues = 0usize;
                let mut global = Vec::new();
                let failures = self
                    .validator
                    .iter_errors(&value)
                    .map(|error| (error.instance_path.to_string(), error.to_string()))
                    .collect::<Vec<_>>();
                for (pointer, message) in failures {
                    issues += 1;
                    if !self.set_error(&pointer, message.clone()) {
                        let prefix = if pointer.is_empty() {
                            "<root>".to_string()
                        } else {
                            pointer
                        };
                        global.push(format!("{prefix}: {message}"));
                    }
                }
                ValidationOutcome::Invalid {
                    issues,
                    global_errors: global,
                }
            }
            Err(err) => {
                self.set_error(&err.pointer, err.message.clone());
                ValidationOutcome::BuildError {
                    message: err.message,
                }
            }
        }
    }

    /// Refresh the error shown on a single field after it was edited.
    pub fn validate_field(&mut self, name: &str) {
        let Some(pointer) = self.field(name).map(|field| field.schema.pointer.clone()) else {
            return;
        };
        match self.build_value() {
            Ok(value) => {
                let message = self
                    .validator
                    .iter_errors(&value)
                    .find(|error| error.instance_path.to_string() == pointer)
                    .map(|error| error.to_string());
                match message {
                    Some(message) => {
                        self.set_error(&pointer, message);
                    }
                    None => self.clear_error(&pointer),
                }
            }
            Err(err) if err.pointer == pointer => {
                self.set_error(&err.pointer, err.message);
            }
            Err(_) => self.clear_error(&pointer),
        }
    }

    pub fn clear_errors(&mut self) {
        for field in &mut self.fields {
            field.clear_error();
        }
    }

    fn active_index(&self, name: &str) -> Result<usize, BindError> {
        if self.record.is_none() {
            return Err(BindError::Inactive);
        }
        self.fields
            .iter()
            .position(|field| field.name() == name)
            .ok_or_else(|| BindError::UnknownField(name.to_string()))
    }

    /// The bound record's JSON with every field's current input laid over it.
    fn build_value(&self) -> Result<Value, FieldCoercionError> {
        let Some(record) = &self.record else {
            return Err(FieldCoercionError {
                pointer: String::new(),
                message: BindError::Inactive.to_string(),
            });
        };
        let mut value = snapshot_of(record);
        let Some(object) = value.as_object_mut() else {
            return Err(FieldCoercionError {
                pointer: String::new(),
                message: format!("{} does not serialize to an object", E::LABEL),
            });
        };
        for field in &self.fields {
            let current = field.current_value()?.unwrap_or(Value::Null);
            object.insert(field.name().to_string(), current);
        }
        Ok(value)
    }

    fn write_through(&mut self, index: usize) {
        let Some(record) = &mut self.record else {
            return;
        };
        let field = &mut self.fields[index];
        let current = match field.current_value() {
            Ok(value) => value.unwrap_or(Value::Null),
            Err(err) => {
                field.set_error(err.message);
                return;
            }
        };
        let mut value = snapshot_of(record);
        if let Some(object) = value.as_object_mut() {
            object.insert(field.name().to_string(), current);
        }
        match serde_json::from_value::<E>(value) {
            Ok(updated) => *record = updated,
            Err(err) => field.set_error(err.to_string()),
        }
    }

    fn set_error(&mut self, pointer: &str, message: String) -> bool {
        match self
            .fields
            .iter_mut()
            .find(|field| field.schema.pointer == pointer)
        {
            Some(field) => {
                field.set_error(message);
                true
            }
            None => false,
        }
    }

    fn clear_error(&mut self, pointer: &str) {
        if let Some(field) = self
            .fields
            .iter_mut()
            .find(|field| field.schema.pointer == pointer)
        {
            field.clear_error();
        }
    }
}

fn snapshot_of<E: Entity>(record: &E) -> Value {
    match serde_json::to_value(record) {
        Ok(value) => value,
        Err(err) => {
            warn!(entity = E::LABEL, error = %err, "record failed to serialize");
            Value::Object(Map::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SamplePerson;
    use chrono::NaiveDate;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn binder() -> FormBinder<SamplePerson> {
        FormBinder::new().expect("binder")
    }

    fn ada() -> SamplePerson {
        SamplePerson {
            id: Some(7),
            version: 3,
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            phone: Some("+44 20 7946 0000".into()),
            date_of_birth: NaiveDate::from_ymd_opt(1815, 12, 10),
            occupation: Some("Mathematician".into()),
            role: None,
            important: true,
        }
    }

    #[test]
    fn set_field_before_load_is_rejected() {
        let mut form = binder();
        assert_eq!(form.set_field("firstName", "Ada"), Err(BindError::Inactive));
        assert!(!form.has_changes());
        assert!(!form.is_valid());
    }

    #[test]
    fn load_then_read_returns_the_same_record() {
        let mut form = binder();
        form.load(ada());
        assert_eq!(form.current_record(), Some(&ada()));
        assert!(!form.has_changes());
        assert!(form.is_valid());
    }

    #[test]
    fn edits_write_through_and_mark_changes() {
        let mut form = binder();
        form.load(ada());
        form.set_field("role", "Manager").unwrap();
        form.set_field("important", false).unwrap();
        form.set_field("dateOfBirth", "1816-01-01").unwrap();
        let record = form.current_record().unwrap();
        assert_eq!(record.role.as_deref(), Some("Manager"));
        assert!(!record.important);
        assert_eq!(record.date_of_birth, NaiveDate::from_ymd_opt(1816, 1, 1));
        assert_eq!(record.id, Some(7));
        assert_eq!(record.version, 3);
        assert!(form.has_changes());
    }

    #[test]
    fn setting_the_same_value_still_counts_as_a_change() {
        let mut form = binder();
        form.load(ada());
        form.set_field("firstName", "Ada").unwrap();
        assert!(form.has_changes());
        form.load(ada());
        assert!(!form.has_changes());
    }

    #[test]
    fn clearing_optional_text_stores_none() {
        let mut form = binder();
        form.load(ada());
        form.set_field("phone", "").unwrap();
        assert_eq!(form.current_record().unwrap().phone, None);
        assert!(form.is_valid());
    }

    #[test]
    fn empty_required_field_or_bad_email_is_invalid() {
        let mut form = binder();
        form.load(ada());
        form.set_field("lastName", "").unwrap();
        assert!(!form.is_valid());
        form.set_field("lastName", "Lovelace").unwrap();
        assert!(form.is_valid());
        form.set_field("email", "not-an-address").unwrap();
        assert!(!form.is_valid());
    }

    #[test]
    fn unparsable_date_keeps_buffer_and_previous_value() {
        let mut form = binder();
        form.load(ada());
        form.set_field("dateOfBirth", "someday").unwrap();
        assert!(!form.is_valid());
        assert_eq!(form.field("dateOfBirth").unwrap().display_value(), "someday");
        assert!(form.field("dateOfBirth").unwrap().error.is_some());
        assert_eq!(
            form.current_record().unwrap().date_of_birth,
            NaiveDate::from_ymd_opt(1815, 12, 10)
        );
    }

    #[test]
    fn validate_projects_errors_onto_fields() {
        let mut form = binder();
        form.load(SamplePerson::default());
        let outcome = form.validate();
        assert!(!outcome.is_valid());
        assert_eq!(form.error_count(), 3);
        assert!(form.field("firstName").unwrap().error.is_some());
        assert!(form.field("lastName").unwrap().error.is_some());
        assert!(form.field("email").unwrap().error.is_some());
        assert!(form.field("phone").unwrap().error.is_none());

        form.set_field("firstName", "Ada").unwrap();
        form.validate_field("firstName");
        assert!(form.field("firstName").unwrap().error.is_none());
    }

    #[test]
    fn key_edits_behave_like_set_field() {
        let mut form = binder();
        form.load(SamplePerson::default());
        let key = KeyEvent::new(KeyCode::Char('Z'), KeyModifiers::SHIFT);
        assert_eq!(form.apply_key("firstName", &key), Ok(true));
        assert_eq!(form.current_record().unwrap().first_name, "Z");
        assert!(form.has_changes());
        let arrow = KeyEvent::new(KeyCode::Up, KeyModifiers::NONE);
        assert_eq!(form.apply_key("firstName", &arrow), Ok(false));
    }

    #[test]
    fn unknown_fields_are_reported() {
        let mut form = binder();
        form.load(SamplePerson::default());
        assert_eq!(
            form.set_field("nickname", "Countess"),
            Err(BindError::UnknownField("nickname".into()))
        );
    }
}
