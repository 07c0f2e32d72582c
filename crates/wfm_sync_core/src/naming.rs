pub const SERVICE_PREFIX: &str = "wfm";

/// Per-team resources whose names follow the `wfm-<team>-...-<env>` convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind<'a> {
    CustomerConfigTable,
    WorkflowsTable,
    WorkflowSchedulesTable,
    WorkflowLibraryTable,
    ExecutionStatusTable,
    NotificationTopic,
    ExecutionQueueProducer,
    ExecutionQueue { tenant: &'a str },
    ExecutionDeadLetterQueue { tenant: &'a str },
    CampaignListDatabase,
    CampaignListTable { tenant: &'a str },
}

pub fn resource_name(team: &str, env: &str, kind: ResourceKind<'_>) -> String {
    let suffix = match kind {
        ResourceKind::CustomerConfigTable => "CustomerConfig",
        ResourceKind::WorkflowsTable => "AMCWorkflows",
        ResourceKind::WorkflowSchedulesTable => "AMCWorkflowSchedules",
        ResourceKind::WorkflowLibraryTable => "AMCWorkflowLibrary",
        ResourceKind::ExecutionStatusTable => "AMCExecutionStatus",
        ResourceKind::NotificationTopic => "SNSTopic",
        ResourceKind::ExecutionQueueProducer => "ExecutionQueueProducer",
        ResourceKind::ExecutionQueue { tenant } => {
            return format!("{SERVICE_PREFIX}-{team}-{env}-workflowExecution-{tenant}.fifo");
        }
        ResourceKind::ExecutionDeadLetterQueue { tenant } => {
            return format!("{SERVICE_PREFIX}-{team}-{env}-workflowExecution-{tenant}-DLQ.fifo");
        }
        // Campaign lists always live in the dev analytics database.
        ResourceKind::CampaignListDatabase => return format!("{team}_amcdataset_dev_analytics"),
        ResourceKind::CampaignListTable { tenant } => {
            return format!("{tenant}_active_campaigns_advertisers_v1_adhoc");
        }
    };
    format!("{SERVICE_PREFIX}-{team}-{suffix}-{env}")
}

pub fn notification_topic_arn(region: &str, account_id: &str, team: &str, env: &str) -> String {
    format!(
        "arn:aws:sns:{region}:{account_id}:{}",
        resource_name(team, env, ResourceKind::NotificationTopic)
    )
}

pub fn data_lake_customer_config_table(prefix: &str, env: &str) -> String {
    format!("{prefix}-data-lake-customer-config-{env}")
}
