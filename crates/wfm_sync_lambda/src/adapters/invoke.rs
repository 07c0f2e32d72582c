use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("failed to invoke {function_name}: {message}")]
pub struct InvokeError {
    pub function_name: String,
    pub message: String,
}

/// Acknowledgement of an `Event` invocation; execution is not awaited.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InvocationAck {
    pub status_code: i32,
}

pub trait FunctionInvoker {
    fn invoke_async(&self, function_name: &str, payload: &[u8]) -> Result<InvocationAck, InvokeError>;
}
