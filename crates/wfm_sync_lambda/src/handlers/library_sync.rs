use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, info_span, warn};

use crate::adapters::config_store::{ConfigStore, TenantRoster};
use crate::adapters::record_store::StoreError;
use crate::error::HandlerError;
use crate::runtime::change::classify_value;
use crate::runtime::contract::{EventName, LibraryRecord, TenantProfile};
use crate::runtime::eligibility::{
    should_create_schedule, should_delete_schedule, should_delete_workflow, tenant_in_scope,
    workflow_upsert_action, SkipReason, WorkflowAction,
};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mutation {
    WorkflowCreated {
        customer_id: String,
        workflow_id: String,
    },
    WorkflowUpdated {
        customer_id: String,
        workflow_id: String,
    },
    WorkflowDeleted {
        customer_id: String,
        workflow_id: String,
    },
    ScheduleCreated {
        customer_id: String,
        schedule_name: String,
    },
    ScheduleDeleted {
        customer_id: String,
        schedule_name: String,
    },
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TenantSkip {
    pub customer_id: String,
    pub workflow_id: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TenantFailure {
    pub customer_id: String,
    pub workflow_id: String,
    pub error: String,
}

/// Everything one library change did across the tenant roster.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct FanOutReport {
    pub tenants_evaluated: usize,
    pub mutations: Vec<Mutation>,
    pub skips: Vec<TenantSkip>,
    pub failures: Vec<TenantFailure>,
}

impl FanOutReport {
    fn merge(&mut self, other: FanOutReport) {
        self.tenants_evaluated += other.tenants_evaluated;
        self.mutations.extend(other.mutations);
        self.skips.extend(other.skips);
        self.failures.extend(other.failures);
    }

    fn skip(&mut self, tenant: &TenantProfile, record: &LibraryRecord, reason: SkipReason) {
        info!(
            customer_id = %tenant.customer_id,
            workflow_id = record.workflow_id(),
            reason = reason.as_str(),
            "tenant skipped"
        );
        self.skips.push(TenantSkip {
            customer_id: tenant.customer_id.clone(),
            workflow_id: record.workflow_id().to_string(),
            reason,
        });
    }

    fn record(&mut self, mutation: Mutation) {
        info!(mutation = ?mutation, "tenant record mutated");
        self.mutations.push(mutation);
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RecordFailure {
    pub index: usize,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct LibrarySyncResponse {
    pub records_received: usize,
    pub records_applied: usize,
    pub record_failures: Vec<RecordFailure>,
    pub report: FanOutReport,
}

/// Request to replay the whole library for one newly onboarded tenant.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapRequest {
    pub customer_id: String,
    #[serde(default)]
    pub deploy_for_new_customer: bool,
}

impl BootstrapRequest {
    fn from_event(event: &Value) -> Option<Self> {
        let request: Self = serde_json::from_value(event.clone()).ok()?;
        request.deploy_for_new_customer.then_some(request)
    }
}

/// Applies one library change to every tenant in `tenants`.
///
/// Tenants are isolated: a store failure is logged, recorded in the report
/// and does not stop the remaining tenants.
pub fn apply(
    store: &ConfigStore<'_>,
    record: &LibraryRecord,
    event: EventName,
    tenants: &TenantRoster,
) -> FanOutReport {
    let span = info_span!("library_change", workflow_id = record.workflow_id(), event = %event);
    let _guard = span.enter();

    let mut report = FanOutReport::default();
    for tenant in tenants.values() {
        report.tenants_evaluated += 1;

        if let Err(reason) = tenant_in_scope(record, tenant) {
            report.skip(tenant, record, reason);
            continue;
        }

        let outcome = match event {
            EventName::Insert | EventName::Modify => {
                upsert_for_tenant(store, record, tenant, &mut report)
            }
            EventName::Remove => remove_for_tenant(store, record, tenant, &mut report),
        };

        if let Err(store_error) = outcome {
            error!(
                customer_id = %tenant.customer_id,
                workflow_id = record.workflow_id(),
                error = %store_error,
                "tenant propagation failed"
            );
            report.failures.push(TenantFailure {
                customer_id: tenant.customer_id.clone(),
                workflow_id: record.workflow_id().to_string(),
                error: store_error.to_string(),
            });
        }
    }
    report
}

fn upsert_for_tenant(
    store: &ConfigStore<'_>,
    record: &LibraryRecord,
    tenant: &TenantProfile,
    report: &mut FanOutReport,
) -> Result<(), StoreError> {
    let customer_id = tenant.customer_id.as_str();
    let flags = tenant.flags();
    let exists = store.workflow_exists(customer_id, record.workflow_id())?;

    let action = match workflow_upsert_action(flags, exists) {
        Ok(action) => action,
        Err(reason) => {
            report.skip(tenant, record, reason);
            return Ok(());
        }
    };

    store.put_workflow(&record.tenant_workflow(customer_id))?;
    let (customer_id, workflow_id) = (customer_id.to_string(), record.workflow_id().to_string());
    report.record(match action {
        WorkflowAction::Create => Mutation::WorkflowCreated {
            customer_id,
            workflow_id,
        },
        WorkflowAction::Update => Mutation::WorkflowUpdated {
            customer_id,
            workflow_id,
        },
    });

    let (Some(schedule), Some(schedule_name)) = (
        record.tenant_schedule(&tenant.customer_id),
        record.schedule_name(),
    ) else {
        return Ok(());
    };
    if !flags.schedule_creation {
        return Ok(());
    }
    let schedule_exists = store.schedule_exists(&tenant.customer_id, schedule_name)?;
    if should_create_schedule(flags, schedule_exists) {
        store.put_schedule(&schedule)?;
        report.record(Mutation::ScheduleCreated {
            customer_id: tenant.customer_id.clone(),
            schedule_name: schedule_name.to_string(),
        });
    }
    Ok(())
}

fn remove_for_tenant(
    store: &ConfigStore<'_>,
    record: &LibraryRecord,
    tenant: &TenantProfile,
    report: &mut FanOutReport,
) -> Result<(), StoreError> {
    let customer_id = tenant.customer_id.as_str();
    let flags = tenant.flags();

    if flags.removal {
        let exists = store.workflow_exists(customer_id, record.workflow_id())?;
        if should_delete_workflow(flags, exists)
            && store.delete_workflow(customer_id, record.workflow_id())?
        {
            report.record(Mutation::WorkflowDeleted {
                customer_id: customer_id.to_string(),
                workflow_id: record.workflow_id().to_string(),
            });
        }
    }

    // Gated separately from the workflow removal above.
    if let Some(schedule_name) = record.schedule_name() {
        if flags.schedule_removal {
            let exists = store.schedule_exists(customer_id, schedule_name)?;
            if should_delete_schedule(flags, exists) {
                store.delete_schedule(customer_id, schedule_name)?;
                report.record(Mutation::ScheduleDeleted {
                    customer_id: customer_id.to_string(),
                    schedule_name: schedule_name.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Entry point for both stream batches and new-customer bootstrap requests.
pub fn handle_library_event(
    event: Value,
    store: &ConfigStore<'_>,
) -> Result<LibrarySyncResponse, HandlerError> {
    if let Some(request) = BootstrapRequest::from_event(&event) {
        return bootstrap_customer(&request.customer_id, store);
    }

    let records = event
        .get("Records")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            HandlerError::InvalidEvent("stream event must include Records array".to_string())
        })?;

    let tenants = store.tenant_configs()?;
    info!(
        records = records.len(),
        tenants = tenants.len(),
        "processing workflow library stream batch"
    );

    let mut response = LibrarySyncResponse {
        records_received: records.len(),
        ..LibrarySyncResponse::default()
    };

    for (index, raw_record) in records.iter().enumerate() {
        let parsed = classify_value(raw_record).and_then(|change| {
            let event = change.event();
            LibraryRecord::from_item(change.into_item()).map(|record| (event, record))
        });

        match parsed {
            Ok((event, record)) => {
                response.report.merge(apply(store, &record, event, &tenants));
                response.records_applied += 1;
            }
            Err(validation_error) => {
                warn!(
                    index,
                    error = %validation_error,
                    "skipping unprocessable stream record"
                );
                response.record_failures.push(RecordFailure {
                    index,
                    error: validation_error.message().to_string(),
                });
            }
        }
    }

    Ok(response)
}

/// Replays every library record as an INSERT scoped to one tenant.
pub fn bootstrap_customer(
    customer_id: &str,
    store: &ConfigStore<'_>,
) -> Result<LibrarySyncResponse, HandlerError> {
    let tenants = store.tenant_config(customer_id)?;
    if tenants.is_empty() {
        warn!(customer_id, "no tenant config found for bootstrap");
    }

    let library = store.library_records()?;
    info!(
        customer_id,
        library_records = library.len(),
        "deploying workflow library for new customer"
    );

    let mut response = LibrarySyncResponse {
        records_received: library.len(),
        ..LibrarySyncResponse::default()
    };

    for (index, item) in library.into_iter().enumerate() {
        match LibraryRecord::from_item(item) {
            Ok(record) => {
                response
                    .report
                    .merge(apply(store, &record, EventName::Insert, &tenants));
                response.records_applied += 1;
            }
            Err(validation_error) => {
                warn!(index, error = %validation_error, "skipping malformed library record");
                response.record_failures.push(RecordFailure {
                    index,
                    error: validation_error.message().to_string(),
                });
            }
        }
    }

    Ok(response)
}
