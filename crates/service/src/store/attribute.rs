//! JSON ⇄ DynamoDB `AttributeValue` encoding.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use models::Item;
use serde_json::{Map, Number, Value};

use crate::errors::ServiceError;

pub fn to_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(items) => AttributeValue::L(items.iter().map(to_attribute).collect()),
        Value::Object(map) => {
            AttributeValue::M(map.iter().map(|(k, v)| (k.clone(), to_attribute(v))).collect())
        }
    }
}

pub fn from_attribute(attr: &AttributeValue) -> Result<Value, ServiceError> {
    let value = match attr {
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => Value::Number(parse_number(n)?),
        AttributeValue::L(items) => {
            Value::Array(items.iter().map(from_attribute).collect::<Result<_, _>>()?)
        }
        AttributeValue::M(map) => Value::Object(from_attribute_map(map)?),
        AttributeValue::Ss(set) => Value::Array(set.iter().cloned().map(Value::String).collect()),
        AttributeValue::Ns(set) => Value::Array(
            set.iter()
                .map(|n| parse_number(n).map(Value::Number))
                .collect::<Result<_, _>>()?,
        ),
        other => {
            return Err(ServiceError::Backend(format!("unsupported attribute type: {other:?}")));
        }
    };
    Ok(value)
}

/// DynamoDB numbers are decimal strings; keep integers exact.
fn parse_number(raw: &str) -> Result<Number, ServiceError> {
    if let Ok(i) = raw.parse::<i64>() {
        return Ok(Number::from(i));
    }
    if let Ok(u) = raw.parse::<u64>() {
        return Ok(Number::from(u));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .ok_or_else(|| ServiceError::Backend(format!("invalid number attribute: {raw}")))
}

pub fn from_attribute_map(
    attrs: &HashMap<String, AttributeValue>,
) -> Result<Map<String, Value>, ServiceError> {
    attrs
        .iter()
        .map(|(k, v)| from_attribute(v).map(|v| (k.clone(), v)))
        .collect()
}

pub fn item_to_attributes(item: Item) -> HashMap<String, AttributeValue> {
    item.into_record()
        .into_iter()
        .map(|(k, v)| {
            let attr = to_attribute(&v);
            (k, attr)
        })
        .collect()
}

pub fn item_from_attributes(attrs: &HashMap<String, AttributeValue>) -> Result<Item, ServiceError> {
    Ok(Item::from_record(from_attribute_map(attrs)?)?)
}
