use thiserror::Error;

use crate::adapters::invoke::InvokeError;
use crate::adapters::record_store::StoreError;
use crate::runtime::contract::ValidationError;
use crate::settings::SettingsError;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("invalid event: {0}")]
    InvalidEvent(String),
    #[error("workflow {workflow_id} not found for customer {customer_id}")]
    WorkflowNotFound {
        customer_id: String,
        workflow_id: String,
    },
    #[error("workflow {workflow_id} has no value for {parameter} in its request or defaultPayload")]
    MissingWorkflowParameter {
        workflow_id: String,
        parameter: &'static str,
    },
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Invoke(#[from] InvokeError),
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ValidationError> for HandlerError {
    fn from(error: ValidationError) -> Self {
        Self::InvalidEvent(error.message().to_string())
    }
}
