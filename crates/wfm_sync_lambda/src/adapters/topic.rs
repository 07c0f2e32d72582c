use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("failed to publish to {topic_arn}: {message}")]
pub struct PublishError {
    pub topic_arn: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicMessage<'a> {
    pub topic_arn: &'a str,
    pub subject: &'a str,
    pub body: &'a str,
    /// Required by FIFO topics, ignored otherwise.
    pub group_id: Option<&'a str>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublishReceipt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<String>,
}

pub trait TopicPublisher {
    fn publish(&self, message: &TopicMessage<'_>) -> Result<PublishReceipt, PublishError>;
}
