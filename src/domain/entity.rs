use std::fmt::Debug;

use schemars::JsonSchema;
use serde::{Serialize, de::DeserializeOwned};

pub type EntityId = i64;

/// A persistable record with a store-assigned identity and an optimistic-lock
/// version.
///
/// Validation rules live on the type's derived JSON Schema; identity and
/// version are expected to be left out of that schema so they never become
/// form fields.
pub trait Entity:
    Clone + Default + PartialEq + Debug + Serialize + DeserializeOwned + JsonSchema + Send + Sync + 'static
{
    /// Noun used in user-facing messages ("The requested person was not found").
    const LABEL: &'static str;

    /// `None` until the record has been saved once.
    fn id(&self) -> Option<EntityId>;

    fn version(&self) -> i32;

    /// Called by stores after a successful insert or update.
    fn stamp(&mut self, id: EntityId, version: i32);

    fn is_persisted(&self) -> bool {
        self.id().is_some()
    }
}
