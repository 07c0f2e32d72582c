//! Per-tenant eligibility rules for library propagation.

use serde::Serialize;

use crate::contract::{LibraryRecord, TenantProfile, WorkflowLibraryFlags};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    EndemicTypeMismatch,
    CustomerPrefixMismatch,
    UpdatesDisabled,
    NewContentDisabled,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EndemicTypeMismatch => "endemic_type_mismatch",
            Self::CustomerPrefixMismatch => "customer_prefix_mismatch",
            Self::UpdatesDisabled => "updates_disabled",
            Self::NewContentDisabled => "new_content_disabled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowAction {
    Create,
    Update,
}

/// Exact-match filter check. A record filter that is absent or empty
/// matches every tenant.
pub fn tenant_in_scope(record: &LibraryRecord, tenant: &TenantProfile) -> Result<(), SkipReason> {
    if let Some(endemic_type) = record.endemic_type_filter() {
        if endemic_type != tenant.endemic_type() {
            return Err(SkipReason::EndemicTypeMismatch);
        }
    }
    if let Some(prefix) = record.customer_prefix_filter() {
        if prefix != tenant.customer_prefix() {
            return Err(SkipReason::CustomerPrefixMismatch);
        }
    }
    Ok(())
}

pub fn workflow_upsert_action(
    flags: WorkflowLibraryFlags,
    workflow_exists: bool,
) -> Result<WorkflowAction, SkipReason> {
    match (workflow_exists, flags.updates, flags.new_content) {
        (true, false, _) => Err(SkipReason::UpdatesDisabled),
        (true, true, _) => Ok(WorkflowAction::Update),
        (false, _, false) => Err(SkipReason::NewContentDisabled),
        (false, _, true) => Ok(WorkflowAction::Create),
    }
}

/// Schedules are only ever created, never overwritten.
pub fn should_create_schedule(flags: WorkflowLibraryFlags, schedule_exists: bool) -> bool {
    flags.schedule_creation && !schedule_exists
}

pub fn should_delete_workflow(flags: WorkflowLibraryFlags, workflow_exists: bool) -> bool {
    flags.removal && workflow_exists
}

pub fn should_delete_schedule(flags: WorkflowLibraryFlags, schedule_exists: bool) -> bool {
    flags.schedule_removal && schedule_exists
}
