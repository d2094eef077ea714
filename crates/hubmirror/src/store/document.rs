use std::fmt::Debug;
use std::hash::Hash;

use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Alias, Expr, OnConflict, SimpleExpr};
use sea_orm::{ActiveModelTrait, EntityTrait};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::errors::{Result, StoreError};

/// A record that can be upserted into one collection by its natural key.
pub trait Document: Send + Sized {
    type Entity: EntityTrait;
    type ActiveModel: ActiveModelTrait<Entity = Self::Entity> + Clone + Send + 'static;
    /// The value handed back to callers after a write.
    type Key: Clone + Eq + Hash + Debug + Send;

    /// Collection name used in logs and errors.
    const COLLECTION: &'static str;

    fn key(&self) -> Self::Key;

    fn into_active_model(self, collected_at: DateTimeWithTimeZone) -> Self::ActiveModel;

    /// `ON CONFLICT` clause targeting the natural key.
    fn on_conflict() -> OnConflict;
}

/// A document built from one upstream JSON object.
pub trait FromPayload: Document {
    /// Foreign keys injected by the caller.
    type Context: Copy + Send;

    /// Map a payload onto the collection. `Ok(None)` means the object does not
    /// belong to this collection and is skipped.
    fn from_payload(context: Self::Context, payload: Value) -> Result<Option<Self>>;
}

/// Strip null values from a JSON object to reduce storage size.
///
/// Recurses through objects and arrays. Nulls inside arrays are kept so that
/// positions stay stable.
pub fn strip_null_values(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_null_values(v)))
                .collect(),
        ),
        Value::Array(arr) => Value::Array(arr.into_iter().map(strip_null_values).collect()),
        other => other,
    }
}

/// Deserialize the typed view of `payload` for `collection`.
pub(crate) fn parse<T: DeserializeOwned>(collection: &'static str, payload: &Value) -> Result<T> {
    <T as Deserialize<'_>>::deserialize(payload)
        .map_err(|e| StoreError::invalid(collection, e.to_string()))
}

/// `existing.collected_at <= excluded.collected_at`, so a late writer holding an
/// older timestamp never rolls a row back.
pub(crate) fn collected_at_guard<E: EntityTrait>(column: E::Column) -> SimpleExpr {
    Expr::col((E::default(), column)).lte(Expr::col((Alias::new("excluded"), column)))
}
