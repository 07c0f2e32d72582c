use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::adapters::invoke::{FunctionInvoker, InvocationAck};
use crate::adapters::record_store::RecordStore;
use crate::error::HandlerError;
use crate::runtime::contract::{
    ExecutionRequest, RecordKey, SavedWorkflowInvocation, WorkflowInput, WorkflowInvocationRequest,
    EXECUTION_WINDOW_PARAMETERS, WORKFLOW_ID_ATTRIBUTE,
};
use crate::runtime::naming::{resource_name, ResourceKind};
use crate::settings::InvokeSettings;

const DEFAULT_PAYLOAD_ATTRIBUTE: &str = "defaultPayload";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum InvocationEvent {
    Direct(WorkflowInvocationRequest),
    Saved(SavedWorkflowInvocation),
}

/// Hands the request to the execution queue producer without waiting for it.
pub fn invoke(
    request: &WorkflowInvocationRequest,
    invoker: &dyn FunctionInvoker,
    settings: &InvokeSettings,
) -> Result<InvocationAck, HandlerError> {
    let function_name = resource_name(
        &settings.team_name,
        &settings.env,
        ResourceKind::ExecutionQueueProducer,
    );
    let payload = serde_json::to_vec(&ExecutionRequest::from(request))?;

    let ack = invoker.invoke_async(&function_name, &payload)?;
    info!(
        customer_id = %request.customer_id,
        function_name = %function_name,
        status_code = ack.status_code,
        "workflow execution submitted"
    );
    Ok(ack)
}

/// Runs a workflow stored for the tenant, filling missing time-window
/// parameters from its `defaultPayload`. Nothing is submitted when a
/// parameter is in neither.
pub fn invoke_saved(
    request: &SavedWorkflowInvocation,
    store: &dyn RecordStore,
    invoker: &dyn FunctionInvoker,
    settings: &InvokeSettings,
) -> Result<InvocationAck, HandlerError> {
    let table = resource_name(&settings.team_name, &settings.env, ResourceKind::WorkflowsTable);
    let key = RecordKey::workflow(&request.customer_id, &request.workflow_id);
    let workflow = store
        .query(&table, &key)?
        .into_iter()
        .next()
        .ok_or_else(|| HandlerError::WorkflowNotFound {
            customer_id: request.customer_id.clone(),
            workflow_id: request.workflow_id.clone(),
        })?;

    let mut payload = request.payload.clone();
    let defaults = workflow
        .get(DEFAULT_PAYLOAD_ATTRIBUTE)
        .and_then(Value::as_object);
    for parameter in EXECUTION_WINDOW_PARAMETERS {
        if payload.contains_key(parameter) {
            continue;
        }
        let value = defaults
            .and_then(|defaults| defaults.get(parameter))
            .ok_or_else(|| HandlerError::MissingWorkflowParameter {
                workflow_id: request.workflow_id.clone(),
                parameter,
            })?;
        payload.insert(parameter.to_string(), value.clone());
    }
    payload.insert(
        WORKFLOW_ID_ATTRIBUTE.to_string(),
        Value::String(request.workflow_id.clone()),
    );

    let direct = WorkflowInvocationRequest {
        customer_id: request.customer_id.clone(),
        input: WorkflowInput {
            payload: Value::Object(payload),
        },
    };
    invoke(&direct, invoker, settings)
}

pub fn handle_invocation_event(
    event: Value,
    store: &dyn RecordStore,
    invoker: &dyn FunctionInvoker,
    settings: &InvokeSettings,
) -> Result<InvocationAck, HandlerError> {
    let event: InvocationEvent = serde_json::from_value(event).map_err(|_| {
        HandlerError::InvalidEvent(
            "expected {customerId, Input: {payload}} or {customerId, workflowId, payload}"
                .to_string(),
        )
    })?;

    match event {
        InvocationEvent::Direct(request) => invoke(&request, invoker, settings),
        InvocationEvent::Saved(request) => invoke_saved(&request, store, invoker, settings),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::{item, CapturingInvoker, InMemoryRecordStore};

    const WORKFLOWS_TABLE: &str = "wfm-ats-AMCWorkflows-dev";

    fn settings() -> InvokeSettings {
        InvokeSettings {
            team_name: "ats".to_string(),
            env: "dev".to_string(),
        }
    }

    fn store() -> InMemoryRecordStore {
        InMemoryRecordStore::default().with_table(WORKFLOWS_TABLE, &["customerId", "workflowId"])
    }

    fn sent_payload(invoker: &CapturingInvoker) -> (String, Value) {
        let (function_name, bytes) = invoker
            .invocations()
            .pop()
            .expect("one invocation should be captured");
        let payload = serde_json::from_slice(&bytes).expect("payload should be JSON");
        (function_name, payload)
    }

    #[test]
    fn direct_request_targets_queue_producer() {
        let invoker = CapturingInvoker::default();

        let ack = handle_invocation_event(
            json!({"customerId": "acme", "Input": {"payload": {"workflowId": "wf-sales"}}}),
            &store(),
            &invoker,
            &settings(),
        )
        .expect("invoke should succeed");

        assert_eq!(ack.status_code, 202);
        let (function_name, payload) = sent_payload(&invoker);
        assert_eq!(function_name, "wfm-ats-ExecutionQueueProducer-dev");
        assert_eq!(
            payload,
            json!({"customerId": "acme", "payload": {"workflowId": "wf-sales"}})
        );
    }

    #[test]
    fn saved_workflow_fills_missing_window_parameters() {
        let store = store();
        store.seed(
            WORKFLOWS_TABLE,
            item(json!({
                "customerId": "acme",
                "workflowId": "wf-sales",
                "defaultPayload": {
                    "timeWindowStart": "FIRSTDAYOFOFFSETMONTH(-1)",
                    "timeWindowEnd": "FIRSTDAYOFOFFSETMONTH(0)",
                    "timeWindowType": "EXPLICIT",
                    "workflowExecutedDate": "now()",
                    "ignoreDataGaps": true
                }
            })),
        );
        let invoker = CapturingInvoker::default();

        handle_invocation_event(
            json!({
                "customerId": "acme",
                "workflowId": "wf-sales",
                "payload": {"timeWindowType": "MOST_RECENT_DAY"}
            }),
            &store,
            &invoker,
            &settings(),
        )
        .expect("saved invoke should succeed");

        let (_, sent) = sent_payload(&invoker);
        assert_eq!(
            sent["payload"],
            json!({
                "timeWindowStart": "FIRSTDAYOFOFFSETMONTH(-1)",
                "timeWindowEnd": "FIRSTDAYOFOFFSETMONTH(0)",
                "timeWindowType": "MOST_RECENT_DAY",
                "workflowExecutedDate": "now()",
                "workflowId": "wf-sales"
            })
        );
    }

    #[test]
    fn window_parameter_missing_everywhere_is_not_submitted() {
        let store = store();
        store.seed(
            WORKFLOWS_TABLE,
            item(json!({"customerId": "acme", "workflowId": "wf-sales"})),
        );
        let invoker = CapturingInvoker::default();

        let error = handle_invocation_event(
            json!({
                "customerId": "acme",
                "workflowId": "wf-sales",
                "payload": {"timeWindowStart": "2024-01-01", "timeWindowEnd": "2024-02-01"}
            }),
            &store,
            &invoker,
            &settings(),
        )
        .expect_err("missing window parameter should fail");

        assert!(matches!(
            error,
            HandlerError::MissingWorkflowParameter {
                parameter: "timeWindowType",
                ..
            }
        ));
        assert!(error.to_string().contains("wf-sales"));
        assert!(invoker.invocations().is_empty());
    }

    #[test]
    fn request_supplying_every_window_parameter_needs_no_defaults() {
        let store = store();
        store.seed(
            WORKFLOWS_TABLE,
            item(json!({"customerId": "acme", "workflowId": "wf-sales"})),
        );
        let invoker = CapturingInvoker::default();

        handle_invocation_event(
            json!({
                "customerId": "acme",
                "workflowId": "wf-sales",
                "payload": {
                    "timeWindowStart": "2024-01-01",
                    "timeWindowEnd": "2024-02-01",
                    "timeWindowType": "EXPLICIT",
                    "workflowExecutedDate": "2024-02-02"
                }
            }),
            &store,
            &invoker,
            &settings(),
        )
        .expect("complete request should be submitted");

        let (_, sent) = sent_payload(&invoker);
        assert_eq!(sent["payload"]["workflowId"], json!("wf-sales"));
        assert_eq!(sent["payload"]["timeWindowType"], json!("EXPLICIT"));
    }

    #[test]
    fn missing_saved_workflow_fails() {
        let invoker = CapturingInvoker::default();

        let error = handle_invocation_event(
            json!({"customerId": "acme", "workflowId": "wf-unknown"}),
            &store(),
            &invoker,
            &settings(),
        )
        .expect_err("unknown workflow should fail");

        assert!(matches!(error, HandlerError::WorkflowNotFound { .. }));
        assert!(invoker.invocations().is_empty());
    }

    #[test]
    fn unrecognised_event_is_invalid() {
        let error = handle_invocation_event(
            json!({"workflowId": "wf-sales"}),
            &store(),
            &CapturingInvoker::default(),
            &settings(),
        )
        .expect_err("event without customerId should fail");
        assert!(matches!(error, HandlerError::InvalidEvent(_)));
    }
}
