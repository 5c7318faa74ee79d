use std::collections::HashSet;

use anyhow::{Context, Result, bail};
use schemars::schema_for;
use serde_json::Value;

use super::entity::Entity;

#[derive(Debug, Clone)]
pub struct FormSchema {
    pub title: Option<String>,
    pub fields: Vec<FieldSchema>,
    /// The schema document the fields were read from; compiled into the validator.
    pub root: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Date,
    Boolean,
}

#[derive(Debug, Clone)]
pub struct FieldSchema {
    pub name: String,
    pub pointer: String,
    pub title: String,
    pub description: Option<String>,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSchema {
    pub fn display_label(&self) -> String {
        if self.required {
            format!("{} *", self.title)
        } else {
            self.title.clone()
        }
    }
}

impl FormSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// Derive the entity's JSON Schema and read its flat property list as form fields.
pub fn form_schema_for<E: Entity>() -> Result<FormSchema> {
    let root = serde_json::to_value(schema_for!(E))
        .with_context(|| format!("failed to serialize schema for {}", E::LABEL))?;
    parse_form_schema(&root)
}

pub fn parse_form_schema(schema: &Value) -> Result<FormSchema> {
    if !schema.is_object() {
        bail!("schema must be a JSON object");
    }
    let schema_type = read_type(schema).unwrap_or_else(|| "object".to_string());
    if schema_type != "object" {
        bail!("root schema must be an object, found {schema_type}");
    }
    let properties = schema
        .get("properties")
        .and_then(Value::as_object)
        .context("object schema must define properties")?;
    let required = required_set(schema);

    let mut fields = Vec::with_capacity(properties.len());
    for (name, value) in properties {
        let kind =
            detect_kind(value).with_context(|| format!("unsupported schema for field '{name}'"))?;
        fields.push(FieldSchema {
            name: name.clone(),
            pointer: to_pointer(name),
            title: value
                .get("title")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| prettify_label(name)),
            description: value
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
            kind,
            required: required.contains(name) && kind != FieldKind::Boolean,
        });
    }

    Ok(FormSchema {
        title: schema
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_string),
        fields,
        root: schema.clone(),
    })
}

fn detect_kind(value: &Value) -> Result<FieldKind> {
    match read_type(value).as_deref() {
        Some("string") | None => {
            if value.get("format").and_then(Value::as_str) == Some("date") {
                Ok(FieldKind::Date)
            } else {
                Ok(FieldKind::Text)
            }
        }
        Some("boolean") => Ok(FieldKind::Boolean),
        Some(other) => bail!("unsupported field type {other}"),
    }
}

fn read_type(value: &Value) -> Option<String> {
    match value.get("type")? {
        Value::String(s) => Some(s.to_lowercase()),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|s| s.to_lowercase())
            .find(|s| s != "null"),
        _ => None,
    }
}

fn required_set(schema: &Value) -> HashSet<String> {
    schema
        .get("required")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn to_pointer(name: &str) -> String {
    format!("/{}", name.replace('~', "~0").replace('/', "~1"))
}

/// `dateOfBirth` -> `Date Of Birth`, `first_name` -> `First Name`.
fn prettify_label(raw: &str) -> String {
    let mut result = String::with_capacity(raw.len() + 4);
    let mut capitalize = true;
    for ch in raw.chars() {
        if ch == '_' || ch == '-' {
            result.push(' ');
            capitalize = true;
            continue;
        }
        if ch.is_ascii_uppercase() && !result.is_empty() && !result.ends_with(' ') {
            result.push(' ');
        }
        if capitalize {
            result.push(ch.to_ascii_uppercase());
            capitalize = false;
        } else {
            result.push(ch);
        }
    }
    result.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SamplePerson;
    use serde_json::json;

    #[test]
    fn person_schema_lists_fields_in_declaration_order() {
        let schema = form_schema_for::<SamplePerson>().expect("schema");
        let names = schema
            .fields
            .iter()
            .map(|field| field.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            [
                "firstName",
                "lastName",
                "email",
                "phone",
                "dateOfBirth",
                "occupation",
                "role",
                "important"
            ]
        );
        assert!(schema.field("id").is_none());
        assert!(schema.field("version").is_none());
    }

    #[test]
    fn person_schema_detects_kinds_and_required_fields() {
        let schema = form_schema_for::<SamplePerson>().expect("schema");
        let first = schema.field("firstName").unwrap();
        assert_eq!(first.kind, FieldKind::Text);
        assert!(first.required);
        assert_eq!(first.title, "First Name");
        assert_eq!(first.pointer, "/firstName");

        let dob = schema.field("dateOfBirth").unwrap();
        assert_eq!(dob.kind, FieldKind::Date);
        assert!(!dob.required);

        let important = schema.field("important").unwrap();
        assert_eq!(important.kind, FieldKind::Boolean);
        assert!(!important.required);
        assert!(!schema.field("phone").unwrap().required);
    }

    #[test]
    fn untitled_properties_get_readable_labels() {
        let schema = parse_form_schema(&json!({
            "type": "object",
            "properties": {
                "dateOfBirth": {"type": "string", "format": "date"},
                "home_town": {"type": ["string", "null"]}
            }
        }))
        .unwrap();
        assert_eq!(schema.fields[0].title, "Date Of Birth");
        assert_eq!(schema.fields[1].title, "Home Town");
        assert_eq!(schema.fields[1].kind, FieldKind::Text);
    }

    #[test]
    fn rejects_nested_objects() {
        let err = parse_form_schema(&json!({
            "type": "object",
            "properties": {"address": {"type": "object", "properties": {}}}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("address"));
    }
}
