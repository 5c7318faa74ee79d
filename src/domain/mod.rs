mod entity;
mod person;
mod schema;

pub use entity::{Entity, EntityId};
pub use person::{SamplePerson, sample_people};
pub use schema::{FieldKind, FieldSchema, FormSchema, form_schema_for, parse_form_schema};
