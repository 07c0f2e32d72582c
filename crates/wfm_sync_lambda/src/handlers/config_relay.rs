use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

use crate::adapters::topic::{TopicMessage, TopicPublisher};
use crate::error::HandlerError;
use crate::runtime::contract::table_name_from_arn;
use crate::settings::RelaySettings;

pub const MAX_SUBJECT_CHARS: usize = 100;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RelayResult {
    pub index: usize,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RelayResult {
    pub fn is_published(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct RelayResponse {
    pub published: usize,
    pub failed: usize,
    pub results: Vec<RelayResult>,
}

/// `Record <eventName> for table <table>`, cut to the topic's subject limit.
pub fn relay_subject(record: &Value) -> String {
    let event_name = record
        .get("eventName")
        .and_then(Value::as_str)
        .unwrap_or("UNKNOWN");
    let table = record
        .get("eventSourceARN")
        .and_then(Value::as_str)
        .and_then(table_name_from_arn)
        .unwrap_or("unknown");

    format!("Record {event_name} for table {table}")
        .chars()
        .take(MAX_SUBJECT_CHARS)
        .collect()
}

/// Publishes every record in order; a failed publish does not stop the rest.
pub fn relay(
    records: &[Value],
    publisher: &dyn TopicPublisher,
    settings: &RelaySettings,
) -> Vec<RelayResult> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let subject = relay_subject(record);
            let body = record.to_string();
            let message = TopicMessage {
                topic_arn: &settings.topic_arn,
                subject: &subject,
                body: &body,
                group_id: Some(&settings.message_group_id),
            };

            match publisher.publish(&message) {
                Ok(receipt) => {
                    info!(
                        index,
                        subject = %subject,
                        message_id = receipt.message_id.as_deref().unwrap_or_default(),
                        "record relayed"
                    );
                    RelayResult {
                        index,
                        subject,
                        message_id: receipt.message_id,
                        error: None,
                    }
                }
                Err(publish_error) => {
                    error!(index, subject = %subject, error = %publish_error, "relay failed");
                    RelayResult {
                        index,
                        subject,
                        message_id: None,
                        error: Some(publish_error.to_string()),
                    }
                }
            }
        })
        .collect()
}

pub fn handle_relay_event(
    event: &Value,
    publisher: &dyn TopicPublisher,
    settings: &RelaySettings,
) -> Result<RelayResponse, HandlerError> {
    let records = event
        .get("Records")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            HandlerError::InvalidEvent("stream event must include Records array".to_string())
        })?;

    let results = relay(records, publisher, settings);
    let published = results.iter().filter(|result| result.is_published()).count();
    Ok(RelayResponse {
        published,
        failed: results.len() - published,
        results,
    })
}
