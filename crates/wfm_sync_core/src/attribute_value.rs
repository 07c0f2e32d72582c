//! Decoding of DynamoDB attribute-value JSON (`{"S": "..."}`, `{"M": {...}}`)
//! as delivered in stream images.
//!
//! Strings, booleans, nulls, maps, lists and numbers JSON can hold exactly
//! decode to plain JSON. Sets, binary values and numbers beyond `f64`
//! precision have no faithful plain form; they decode to a wrapper object
//! `{"$attributeValue": {"SS": [...]}}` carrying the original descriptor
//! verbatim, so writing the item back reproduces the stored type.

use serde_json::{Map, Number, Value};

use crate::contract::{Item, ValidationError};

/// Key of the single-entry object wrapping a raw attribute value.
pub const RAW_ATTRIBUTE_KEY: &str = "$attributeValue";

/// Descriptors only ever carried through a raw wrapper.
const RAW_DESCRIPTORS: [&str; 5] = ["N", "B", "SS", "NS", "BS"];

/// Wraps `{descriptor: inner}` so it survives the plain JSON item untouched.
pub fn raw_attribute(descriptor: &str, inner: Value) -> Value {
    let mut attribute = Map::with_capacity(1);
    attribute.insert(descriptor.to_string(), inner);
    let mut wrapper = Map::with_capacity(1);
    wrapper.insert(RAW_ATTRIBUTE_KEY.to_string(), Value::Object(attribute));
    Value::Object(wrapper)
}

/// Descriptor and payload of a raw wrapper, `None` for any other value.
pub fn as_raw_attribute(value: &Value) -> Option<(&str, &Value)> {
    let wrapper = value.as_object()?;
    if wrapper.len() != 1 {
        return None;
    }
    let attribute = wrapper.get(RAW_ATTRIBUTE_KEY)?.as_object()?;
    let mut entries = attribute.iter();
    match (entries.next(), entries.next()) {
        (Some((descriptor, inner)), None) if RAW_DESCRIPTORS.contains(&descriptor.as_str()) => {
            Some((descriptor.as_str(), inner))
        }
        _ => None,
    }
}

/// Decodes a whole stream image into a plain JSON item.
pub fn decode_image(image: &Map<String, Value>) -> Result<Item, ValidationError> {
    let mut item = Map::with_capacity(image.len());
    for (name, attribute) in image {
        let value = decode_attribute(attribute).map_err(|error| {
            ValidationError::new(format!("Attribute '{name}': {}", error.message()))
        })?;
        item.insert(name.clone(), value);
    }
    Ok(item)
}

pub fn decode_attribute(attribute: &Value) -> Result<Value, ValidationError> {
    let Some(object) = attribute.as_object() else {
        return Err(ValidationError::new("attribute value must be a JSON object"));
    };
    let mut entries = object.iter();
    let (Some((tag, inner)), None) = (entries.next(), entries.next()) else {
        return Err(ValidationError::new(
            "attribute value must carry exactly one type descriptor",
        ));
    };

    match tag.as_str() {
        "S" => expect_string(tag, inner).map(|text| Value::String(text.to_string())),
        "B" => expect_string(tag, inner)
            .map(|text| raw_attribute(tag, Value::String(text.to_string()))),
        "N" => decode_number(expect_string(tag, inner)?),
        "BOOL" => inner
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| ValidationError::new("BOOL descriptor must hold a boolean")),
        "NULL" => Ok(Value::Null),
        "M" => {
            let map = inner
                .as_object()
                .ok_or_else(|| ValidationError::new("M descriptor must hold an object"))?;
            decode_image(map).map(Value::Object)
        }
        "L" => expect_array(tag, inner)?
            .iter()
            .map(decode_attribute)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        "SS" | "BS" | "NS" => {
            let members = expect_array(tag, inner)?;
            for member in members {
                let text = expect_string(tag, member)?;
                if tag == "NS" {
                    parse_number(text)?;
                }
            }
            Ok(raw_attribute(tag, Value::Array(members.clone())))
        }
        other => Err(ValidationError::new(format!(
            "Unsupported attribute type descriptor '{other}'"
        ))),
    }
}

/// Decodes a DynamoDB number string to a JSON number when that keeps its
/// exact value, and to a raw `N` wrapper holding the text otherwise.
pub fn decode_number(text: &str) -> Result<Value, ValidationError> {
    let number = parse_number(text)?;
    let exact = match &number {
        Value::Number(parsed) if parsed.is_f64() => parsed.to_string() == text.trim(),
        _ => true,
    };
    if exact {
        Ok(number)
    } else {
        Ok(raw_attribute("N", Value::String(text.to_string())))
    }
}

/// Parses a DynamoDB number string, preferring integers.
fn parse_number(text: &str) -> Result<Value, ValidationError> {
    let trimmed = text.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Ok(Value::Number(value.into()));
    }
    if let Ok(value) = trimmed.parse::<u64>() {
        return Ok(Value::Number(value.into()));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| ValidationError::new(format!("'{text}' is not a valid number")))
}

fn expect_string<'a>(tag: &str, value: &'a Value) -> Result<&'a str, ValidationError> {
    value
        .as_str()
        .ok_or_else(|| ValidationError::new(format!("{tag} descriptor must hold a string")))
}

fn expect_array<'a>(tag: &str, value: &'a Value) -> Result<&'a Vec<Value>, ValidationError> {
    value
        .as_array()
        .ok_or_else(|| ValidationError::new(format!("{tag} descriptor must hold a list")))
}
