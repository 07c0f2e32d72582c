//! Per-entry-point settings read from the Lambda environment.

use thiserror::Error;

use crate::adapters::config_store::WorkflowTables;

pub const DEFAULT_MESSAGE_GROUP_ID: &str = "TenantConfig";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("{0} must be configured")]
    Missing(&'static str),
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, SettingsError> {
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(SettingsError::Missing(name))
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibrarySyncSettings {
    pub tables: WorkflowTables,
}

impl LibrarySyncSettings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        Ok(Self {
            tables: WorkflowTables {
                customers: required(&lookup, "CUSTOMERS_DYNAMODB_TABLE")?,
                library: required(&lookup, "WORKFLOW_LIBRARY_DYNAMODB_TABLE")?,
                workflows: required(&lookup, "WORKFLOWS_TABLE_NAME")?,
                schedules: required(&lookup, "WORKFLOW_SCHEDULE_TABLE")?,
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaySettings {
    pub topic_arn: String,
    pub message_group_id: String,
}

impl RelaySettings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        Ok(Self {
            topic_arn: required(&lookup, "SNS_TOPIC_ARN")?,
            message_group_id: required(&lookup, "SNS_MESSAGE_GROUP_ID")
                .unwrap_or_else(|_| DEFAULT_MESSAGE_GROUP_ID.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedSettings {
    /// Deployment prefix of the data-lake tables.
    pub prefix: String,
    pub env: String,
    pub region: String,
    pub account_id: String,
}

impl SeedSettings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        Ok(Self {
            prefix: required(&lookup, "Prefix")?,
            env: required(&lookup, "ENV")?,
            region: required(&lookup, "Region")?,
            account_id: required(&lookup, "AccountId")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeSettings {
    pub team_name: String,
    pub env: String,
}

impl InvokeSettings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        Ok(Self {
            team_name: required(&lookup, "TEAM_NAME")?,
            env: required(&lookup, "ENV")?,
        })
    }
}
