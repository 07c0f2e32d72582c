//! In-memory fakes for the adapter traits.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use serde_json::Value;

use crate::adapters::config_store::WorkflowTables;
use crate::adapters::invoke::{FunctionInvoker, InvocationAck, InvokeError};
use crate::adapters::record_store::{DeleteCondition, RecordStore, StoreError};
use crate::adapters::topic::{PublishError, PublishReceipt, TopicMessage, TopicPublisher};
use crate::runtime::contract::{
    Item, RecordKey, CUSTOMER_ID_ATTRIBUTE, DATA_LAKE_CUSTOMER_KEY_ATTRIBUTE,
    SCHEDULE_NAME_ATTRIBUTE, WORKFLOW_ID_ATTRIBUTE,
};

pub fn item(value: Value) -> Item {
    value
        .as_object()
        .cloned()
        .expect("fixture should be a JSON object")
}

pub fn sample_tables() -> WorkflowTables {
    WorkflowTables {
        customers: "wfm-ats-CustomerConfig-dev".to_string(),
        library: "wfm-ats-AMCWorkflowLibrary-dev".to_string(),
        workflows: "wfm-ats-AMCWorkflows-dev".to_string(),
        schedules: "wfm-ats-AMCWorkflowSchedules-dev".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Put { table: String, item: Item },
    Delete { table: String, key: RecordKey },
}

#[derive(Default)]
struct StoreState {
    tables: BTreeMap<String, Vec<Item>>,
    calls: Vec<StoreCall>,
}

/// Key-schema-aware table fake with failure injection.
#[derive(Default)]
pub struct InMemoryRecordStore {
    key_schemas: BTreeMap<String, Vec<&'static str>>,
    state: Mutex<StoreState>,
    failing_customers: BTreeSet<String>,
    conflicting_tables: BTreeSet<String>,
}

impl InMemoryRecordStore {
    pub fn for_tables(tables: &WorkflowTables) -> Self {
        Self::default()
            .with_table(&tables.customers, &[CUSTOMER_ID_ATTRIBUTE])
            .with_table(&tables.library, &[WORKFLOW_ID_ATTRIBUTE])
            .with_table(
                &tables.workflows,
                &[CUSTOMER_ID_ATTRIBUTE, WORKFLOW_ID_ATTRIBUTE],
            )
            .with_table(
                &tables.schedules,
                &[CUSTOMER_ID_ATTRIBUTE, SCHEDULE_NAME_ATTRIBUTE],
            )
    }

    pub fn with_table(mut self, table: &str, key_attributes: &[&'static str]) -> Self {
        self.key_schemas
            .insert(table.to_string(), key_attributes.to_vec());
        self
    }

    pub fn with_data_lake_table(self, table: &str) -> Self {
        self.with_table(table, &[DATA_LAKE_CUSTOMER_KEY_ATTRIBUTE])
    }

    /// Every operation touching this customer's records fails.
    pub fn failing_for_customer(mut self, customer_id: &str) -> Self {
        self.failing_customers.insert(customer_id.to_string());
        self
    }

    /// Every put on this table fails its conditional check.
    pub fn conflicting_on(mut self, table: &str) -> Self {
        self.conflicting_tables.insert(table.to_string());
        self
    }

    pub fn seed(&self, table: &str, item: Item) {
        self.state
            .lock()
            .expect("poisoned mutex")
            .tables
            .entry(table.to_string())
            .or_default()
            .push(item);
    }

    pub fn items(&self, table: &str) -> Vec<Item> {
        self.state
            .lock()
            .expect("poisoned mutex")
            .tables
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().expect("poisoned mutex").calls.clone()
    }

    pub fn puts_to(&self, table: &str) -> Vec<Item> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::Put { table: target, item } if target == table => Some(item),
                _ => None,
            })
            .collect()
    }

    fn key_schema(&self, table: &str) -> Result<&[&'static str], StoreError> {
        self.key_schemas
            .get(table)
            .map(Vec::as_slice)
            .ok_or_else(|| StoreError::Backend {
                operation: "describe",
                table: table.to_string(),
                message: "table does not exist".to_string(),
            })
    }

    fn check_customer(
        &self,
        operation: &'static str,
        table: &str,
        customer_id: Option<&str>,
    ) -> Result<(), StoreError> {
        match customer_id {
            Some(id) if self.failing_customers.contains(id) => Err(StoreError::Backend {
                operation,
                table: table.to_string(),
                message: format!("injected failure for customer {id}"),
            }),
            _ => Ok(()),
        }
    }
}

impl RecordStore for InMemoryRecordStore {
    fn scan(&self, table: &str) -> Result<Vec<Item>, StoreError> {
        self.key_schema(table)?;
        Ok(self.items(table))
    }

    fn query(&self, table: &str, key: &RecordKey) -> Result<Vec<Item>, StoreError> {
        self.key_schema(table)?;
        self.check_customer("query", table, key.get(CUSTOMER_ID_ATTRIBUTE))?;
        Ok(self
            .items(table)
            .into_iter()
            .filter(|item| key.matches(item))
            .collect())
    }

    fn exists(&self, table: &str, key: &RecordKey) -> Result<bool, StoreError> {
        Ok(!self.query(table, key)?.is_empty())
    }

    fn put(&self, table: &str, item: &Item) -> Result<(), StoreError> {
        let schema = self.key_schema(table)?.to_vec();
        self.check_customer(
            "put_item",
            table,
            item.get(CUSTOMER_ID_ATTRIBUTE).and_then(Value::as_str),
        )?;
        if self.conflicting_tables.contains(table) {
            return Err(StoreError::ConditionalCheckFailed {
                table: table.to_string(),
            });
        }
        let key = RecordKey::from_item(item, &schema).ok_or_else(|| StoreError::Backend {
            operation: "put_item",
            table: table.to_string(),
            message: "item is missing key attributes".to_string(),
        })?;

        let mut state = self.state.lock().expect("poisoned mutex");
        let rows = state.tables.entry(table.to_string()).or_default();
        rows.retain(|existing| !key.matches(existing));
        rows.push(item.clone());
        state.calls.push(StoreCall::Put {
            table: table.to_string(),
            item: item.clone(),
        });
        Ok(())
    }

    fn delete(
        &self,
        table: &str,
        key: &RecordKey,
        condition: DeleteCondition,
    ) -> Result<(), StoreError> {
        self.key_schema(table)?;
        self.check_customer("delete_item", table, key.get(CUSTOMER_ID_ATTRIBUTE))?;

        let mut state = self.state.lock().expect("poisoned mutex");
        let rows = state.tables.entry(table.to_string()).or_default();
        let before = rows.len();
        rows.retain(|existing| !key.matches(existing));
        if before == rows.len() && condition == DeleteCondition::KeyExists {
            return Err(StoreError::ConditionalCheckFailed {
                table: table.to_string(),
            });
        }
        state.calls.push(StoreCall::Delete {
            table: table.to_string(),
            key: key.clone(),
        });
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub topic_arn: String,
    pub subject: String,
    pub body: String,
    pub group_id: Option<String>,
}

/// Records publishes; subjects containing `failing_subject` are rejected.
#[derive(Default)]
pub struct CapturingPublisher {
    messages: Mutex<Vec<PublishedMessage>>,
    failing_subject: Option<&'static str>,
}

impl CapturingPublisher {
    pub fn failing_on(failing_subject: &'static str) -> Self {
        Self {
            failing_subject: Some(failing_subject),
            ..Self::default()
        }
    }

    pub fn messages(&self) -> Vec<PublishedMessage> {
        self.messages.lock().expect("poisoned mutex").clone()
    }
}

impl TopicPublisher for CapturingPublisher {
    fn publish(&self, message: &TopicMessage<'_>) -> Result<PublishReceipt, PublishError> {
        if let Some(fragment) = self.failing_subject {
            if message.subject.contains(fragment) {
                return Err(PublishError {
                    topic_arn: message.topic_arn.to_string(),
                    message: "simulated publish failure".to_string(),
                });
            }
        }

        let mut messages = self.messages.lock().expect("poisoned mutex");
        messages.push(PublishedMessage {
            topic_arn: message.topic_arn.to_string(),
            subject: message.subject.to_string(),
            body: message.body.to_string(),
            group_id: message.group_id.map(str::to_string),
        });
        Ok(PublishReceipt {
            message_id: Some(format!("msg-{}", messages.len())),
            sequence_number: None,
        })
    }
}

#[derive(Default)]
pub struct CapturingInvoker {
    invocations: Mutex<Vec<(String, Vec<u8>)>>,
}

impl CapturingInvoker {
    pub fn invocations(&self) -> Vec<(String, Vec<u8>)> {
        self.invocations.lock().expect("poisoned mutex").clone()
    }
}

impl FunctionInvoker for CapturingInvoker {
    fn invoke_async(&self, function_name: &str, payload: &[u8]) -> Result<InvocationAck, InvokeError> {
        self.invocations
            .lock()
            .expect("poisoned mutex")
            .push((function_name.to_string(), payload.to_vec()));
        Ok(InvocationAck { status_code: 202 })
    }
}
