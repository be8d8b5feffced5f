use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use common::utils::time::now_iso8601;

use crate::errors::ModelError;

/// Attribute name of the partition key.
pub const ID_FIELD: &str = "id";
/// Attribute name of the creation timestamp.
pub const CREATED_AT_FIELD: &str = "createdAt";

/// Fields owned by the server; never taken from a request body.
pub const IMMUTABLE_FIELDS: [&str; 2] = [ID_FIELD, CREATED_AT_FIELD];

/// The single persisted entity.
///
/// Serialized flat: `id` and `createdAt` sit next to the client attributes,
/// e.g. `{"id":"…","createdAt":"…","name":"widget"}`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub id: String,
    #[serde(rename = "createdAt", default, skip_serializing_if = "String::is_empty")]
    pub created_at: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Item {
    /// Build a fresh item from a client payload: any `id`/`createdAt` the
    /// client sent is discarded and server values are stamped in.
    pub fn stamp(mut payload: Map<String, Value>) -> Self {
        for field in IMMUTABLE_FIELDS {
            payload.remove(field);
        }
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now_iso8601(),
            attributes: payload,
        }
    }

    /// Rebuild an item from the flat attribute map a backend returns.
    pub fn from_record(record: Map<String, Value>) -> Result<Self, ModelError> {
        let item: Item = serde_json::from_value(Value::Object(record))
            .map_err(|e| ModelError::Malformed(e.to_string()))?;
        if item.id.is_empty() {
            return Err(ModelError::Malformed("record has an empty id".into()));
        }
        Ok(item)
    }

    /// Flatten into the attribute map a backend stores.
    pub fn into_record(self) -> Map<String, Value> {
        let mut record = self.attributes;
        record.insert(ID_FIELD.into(), Value::String(self.id));
        if !self.created_at.is_empty() {
            record.insert(CREATED_AT_FIELD.into(), Value::String(self.created_at));
        }
        record
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        validate_id(&self.id)
    }
}

pub fn validate_id(id: &str) -> Result<(), ModelError> {
    if id.is_empty() {
        return Err(ModelError::Validation("item id must not be empty".into()));
    }
    Ok(())
}

/// Require a JSON object body (create and update payloads).
pub fn payload_object(value: Value) -> Result<Map<String, Value>, ModelError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ModelError::Validation(format!(
            "request body must be a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Field → new value mapping for a partial update.
///
/// Immutable fields are dropped on construction so a patch can never touch
/// `id` or `createdAt`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Patch {
    fields: Map<String, Value>,
}

impl Patch {
    pub fn from_value(value: Value) -> Result<Self, ModelError> {
        payload_object(value).map(Self::from_map)
    }

    pub fn from_map(mut fields: Map<String, Value>) -> Self {
        for field in IMMUTABLE_FIELDS {
            fields.remove(field);
        }
        Self { fields }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
