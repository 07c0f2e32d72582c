//! SDK-backed implementations of the adapter traits.
//!
//! The traits are synchronous; calls bridge onto the Lambda runtime's
//! multi-threaded tokio executor with `block_in_place`.

use std::collections::HashMap;
use std::future::Future;

use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_lambda::types::InvocationType;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{Map, Value};

use crate::adapters::invoke::{FunctionInvoker, InvocationAck, InvokeError};
use crate::adapters::record_store::{DeleteCondition, RecordStore, StoreError};
use crate::adapters::topic::{PublishError, PublishReceipt, TopicMessage, TopicPublisher};
use crate::runtime::attribute_value::{as_raw_attribute, decode_number, raw_attribute};
use crate::runtime::contract::{Item, RecordKey};

fn block_on<F: Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

type SdkItem = HashMap<String, AttributeValue>;

fn number(text: &str) -> Result<Value, String> {
    decode_number(text).map_err(|error| error.to_string())
}

fn encoded(blob: &Blob) -> Value {
    Value::String(STANDARD.encode(blob.as_ref()))
}

pub fn from_attribute_value(attribute: &AttributeValue) -> Result<Value, String> {
    let value = match attribute {
        AttributeValue::S(text) => Value::String(text.clone()),
        AttributeValue::N(text) => number(text)?,
        AttributeValue::B(blob) => raw_attribute("B", encoded(blob)),
        AttributeValue::Bool(flag) => Value::Bool(*flag),
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::M(map) => Value::Object(from_sdk_item(map)?),
        AttributeValue::L(list) => Value::Array(
            list.iter()
                .map(from_attribute_value)
                .collect::<Result<_, _>>()?,
        ),
        AttributeValue::Ss(values) => raw_attribute(
            "SS",
            Value::Array(values.iter().cloned().map(Value::String).collect()),
        ),
        AttributeValue::Ns(values) => {
            for text in values {
                number(text)?;
            }
            raw_attribute(
                "NS",
                Value::Array(values.iter().cloned().map(Value::String).collect()),
            )
        }
        AttributeValue::Bs(blobs) => {
            raw_attribute("BS", Value::Array(blobs.iter().map(encoded).collect()))
        }
        other => return Err(format!("unsupported attribute value {other:?}")),
    };
    Ok(value)
}

pub fn from_sdk_item(item: &SdkItem) -> Result<Item, String> {
    item.iter()
        .map(|(name, attribute)| Ok((name.clone(), from_attribute_value(attribute)?)))
        .collect()
}

fn strings(descriptor: &str, inner: &Value) -> Result<Vec<String>, String> {
    let members = inner
        .as_array()
        .ok_or_else(|| format!("{descriptor} set must be a list"))?;
    members
        .iter()
        .map(|member| {
            member
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| format!("{descriptor} set members must be strings"))
        })
        .collect()
}

fn blob(descriptor: &str, text: &str) -> Result<Blob, String> {
    STANDARD
        .decode(text)
        .map(Blob::new)
        .map_err(|error| format!("{descriptor} value is not valid base64: {error}"))
}

fn from_raw_attribute(descriptor: &str, inner: &Value) -> Result<AttributeValue, String> {
    let scalar = || {
        inner
            .as_str()
            .ok_or_else(|| format!("{descriptor} value must be a string"))
    };
    match descriptor {
        "N" => Ok(AttributeValue::N(scalar()?.to_string())),
        "B" => Ok(AttributeValue::B(blob(descriptor, scalar()?)?)),
        "SS" => Ok(AttributeValue::Ss(strings(descriptor, inner)?)),
        "NS" => Ok(AttributeValue::Ns(strings(descriptor, inner)?)),
        "BS" => strings(descriptor, inner)?
            .iter()
            .map(|text| blob(descriptor, text))
            .collect::<Result<_, _>>()
            .map(AttributeValue::Bs),
        other => Err(format!("unsupported raw attribute descriptor '{other}'")),
    }
}

/// Plain JSON maps one to one; raw attribute wrappers turn back into the
/// set, binary or number attribute they were decoded from.
pub fn to_attribute_value(value: &Value) -> Result<AttributeValue, String> {
    if let Some((descriptor, inner)) = as_raw_attribute(value) {
        return from_raw_attribute(descriptor, inner);
    }
    let attribute = match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(flag) => AttributeValue::Bool(*flag),
        Value::Number(number) => AttributeValue::N(number.to_string()),
        Value::String(text) => AttributeValue::S(text.clone()),
        Value::Array(values) => AttributeValue::L(
            values
                .iter()
                .map(to_attribute_value)
                .collect::<Result<_, _>>()?,
        ),
        Value::Object(map) => AttributeValue::M(to_sdk_item(map)?),
    };
    Ok(attribute)
}

pub fn to_sdk_item(item: &Map<String, Value>) -> Result<SdkItem, String> {
    item.iter()
        .map(|(name, value)| Ok((name.clone(), to_attribute_value(value)?)))
        .collect()
}

fn key_item(key: &RecordKey) -> SdkItem {
    key.attributes()
        .map(|(name, value)| (name.to_string(), AttributeValue::S(value.to_string())))
        .collect()
}

/// `#k0 = :v0 AND #k1 = :v1` with matching name and value maps.
fn key_condition(key: &RecordKey) -> (String, HashMap<String, String>, SdkItem) {
    let mut clauses = Vec::new();
    let mut names = HashMap::new();
    let mut values = HashMap::new();
    for (index, (name, value)) in key.attributes().enumerate() {
        clauses.push(format!("#k{index} = :v{index}"));
        names.insert(format!("#k{index}"), name.to_string());
        values.insert(format!(":v{index}"), AttributeValue::S(value.to_string()));
    }
    (clauses.join(" AND "), names, values)
}

pub struct DynamoRecordStore {
    client: aws_sdk_dynamodb::Client,
}

impl DynamoRecordStore {
    pub fn new(client: aws_sdk_dynamodb::Client) -> Self {
        Self { client }
    }

    fn decode(table: &str, items: Vec<SdkItem>) -> Result<Vec<Item>, StoreError> {
        items
            .iter()
            .map(|item| {
                from_sdk_item(item).map_err(|message| StoreError::Decode {
                    table: table.to_string(),
                    message,
                })
            })
            .collect()
    }
}

fn backend(operation: &'static str, table: &str, message: impl std::fmt::Display) -> StoreError {
    StoreError::Backend {
        operation,
        table: table.to_string(),
        message: message.to_string(),
    }
}

impl RecordStore for DynamoRecordStore {
    fn scan(&self, table: &str) -> Result<Vec<Item>, StoreError> {
        let items = block_on(
            self.client
                .scan()
                .table_name(table)
                .into_paginator()
                .items()
                .send()
                .try_collect(),
        )
        .map_err(|error| backend("scan", table, DisplayErrorContext(&error)))?;
        Self::decode(table, items)
    }

    fn query(&self, table: &str, key: &RecordKey) -> Result<Vec<Item>, StoreError> {
        let (expression, names, values) = key_condition(key);
        let items = block_on(
            self.client
                .query()
                .table_name(table)
                .key_condition_expression(expression)
                .set_expression_attribute_names(Some(names))
                .set_expression_attribute_values(Some(values))
                .into_paginator()
                .items()
                .send()
                .try_collect(),
        )
        .map_err(|error| backend("query", table, DisplayErrorContext(&error)))?;
        Self::decode(table, items)
    }

    fn exists(&self, table: &str, key: &RecordKey) -> Result<bool, StoreError> {
        let output = block_on(
            self.client
                .get_item()
                .table_name(table)
                .set_key(Some(key_item(key)))
                .consistent_read(true)
                .send(),
        )
        .map_err(|error| backend("get_item", table, DisplayErrorContext(&error)))?;
        Ok(output.item().is_some())
    }

    fn put(&self, table: &str, item: &Item) -> Result<(), StoreError> {
        let item = to_sdk_item(item).map_err(|message| StoreError::Encode {
            table: table.to_string(),
            message,
        })?;
        block_on(
            self.client
                .put_item()
                .table_name(table)
                .set_item(Some(item))
                .send(),
        )
        .map(|_| ())
        .map_err(|error| {
            if error
                .as_service_error()
                .is_some_and(|service| service.is_conditional_check_failed_exception())
            {
                StoreError::ConditionalCheckFailed {
                    table: table.to_string(),
                }
            } else {
                backend("put_item", table, DisplayErrorContext(&error))
            }
        })
    }

    fn delete(
        &self,
        table: &str,
        key: &RecordKey,
        condition: DeleteCondition,
    ) -> Result<(), StoreError> {
        let mut request = self
            .client
            .delete_item()
            .table_name(table)
            .set_key(Some(key_item(key)));

        if condition == DeleteCondition::KeyExists {
            let mut clauses = Vec::new();
            for (index, (name, _)) in key.attributes().enumerate() {
                clauses.push(format!("attribute_exists(#k{index})"));
                request = request.expression_attribute_names(format!("#k{index}"), name);
            }
            request = request.condition_expression(clauses.join(" AND "));
        }

        block_on(request.send()).map(|_| ()).map_err(|error| {
            if error
                .as_service_error()
                .is_some_and(|service| service.is_conditional_check_failed_exception())
            {
                StoreError::ConditionalCheckFailed {
                    table: table.to_string(),
                }
            } else {
                backend("delete_item", table, DisplayErrorContext(&error))
            }
        })
    }
}

pub struct SnsTopicPublisher {
    client: aws_sdk_sns::Client,
}

impl SnsTopicPublisher {
    pub fn new(client: aws_sdk_sns::Client) -> Self {
        Self { client }
    }
}

impl TopicPublisher for SnsTopicPublisher {
    fn publish(&self, message: &TopicMessage<'_>) -> Result<PublishReceipt, PublishError> {
        let output = block_on(
            self.client
                .publish()
                .target_arn(message.topic_arn)
                .subject(message.subject)
                .message(message.body)
                .set_message_group_id(message.group_id.map(str::to_string))
                .send(),
        )
        .map_err(|error| PublishError {
            topic_arn: message.topic_arn.to_string(),
            message: aws_sdk_sns::error::DisplayErrorContext(&error).to_string(),
        })?;

        Ok(PublishReceipt {
            message_id: output.message_id().map(str::to_string),
            sequence_number: output.sequence_number().map(str::to_string),
        })
    }
}

pub struct LambdaFunctionInvoker {
    client: aws_sdk_lambda::Client,
}

impl LambdaFunctionInvoker {
    pub fn new(client: aws_sdk_lambda::Client) -> Self {
        Self { client }
    }
}

impl FunctionInvoker for LambdaFunctionInvoker {
    fn invoke_async(&self, function_name: &str, payload: &[u8]) -> Result<InvocationAck, InvokeError> {
        let output = block_on(
            self.client
                .invoke()
                .function_name(function_name)
                .invocation_type(InvocationType::Event)
                .payload(aws_sdk_lambda::primitives::Blob::new(payload.to_vec()))
                .send(),
        )
        .map_err(|error| InvokeError {
            function_name: function_name.to_string(),
            message: aws_sdk_lambda::error::DisplayErrorContext(&error).to_string(),
        })?;

        Ok(InvocationAck {
            status_code: output.status_code(),
        })
    }
}
