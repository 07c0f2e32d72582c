use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type Item = Map<String, Value>;

pub const CUSTOMER_ID_ATTRIBUTE: &str = "customerId";
pub const WORKFLOW_ID_ATTRIBUTE: &str = "workflowId";
pub const SCHEDULE_NAME_ATTRIBUTE: &str = "Name";
pub const SCHEDULE_ATTRIBUTE: &str = "schedule";
pub const ENDEMIC_TYPE_ATTRIBUTE: &str = "endemicType";
pub const CUSTOMER_PREFIX_ATTRIBUTE: &str = "customerPrefix";
pub const DATA_LAKE_CUSTOMER_KEY_ATTRIBUTE: &str = "customer_hash_key";

pub const COMPLETED_STACK_STATUSES: [&str; 2] = ["CREATE_COMPLETE", "UPDATE_COMPLETE"];

/// Time-window parameters a saved workflow execution needs in its payload.
pub const EXECUTION_WINDOW_PARAMETERS: [&str; 4] = [
    "timeWindowStart",
    "timeWindowEnd",
    "timeWindowType",
    "workflowExecutedDate",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Primary key of a record, as attribute name to string value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordKey(BTreeMap<String, String>);

impl RecordKey {
    pub fn tenant(customer_id: &str) -> Self {
        Self(BTreeMap::from([(
            CUSTOMER_ID_ATTRIBUTE.to_string(),
            customer_id.to_string(),
        )]))
    }

    pub fn workflow(customer_id: &str, workflow_id: &str) -> Self {
        Self(BTreeMap::from([
            (CUSTOMER_ID_ATTRIBUTE.to_string(), customer_id.to_string()),
            (WORKFLOW_ID_ATTRIBUTE.to_string(), workflow_id.to_string()),
        ]))
    }

    pub fn schedule(customer_id: &str, schedule_name: &str) -> Self {
        Self(BTreeMap::from([
            (CUSTOMER_ID_ATTRIBUTE.to_string(), customer_id.to_string()),
            (SCHEDULE_NAME_ATTRIBUTE.to_string(), schedule_name.to_string()),
        ]))
    }

    /// Builds a key from the named string attributes of `item`.
    pub fn from_item(item: &Item, attributes: &[&str]) -> Option<Self> {
        let mut key = BTreeMap::new();
        for attribute in attributes {
            let value = item.get(*attribute)?.as_str()?;
            key.insert((*attribute).to_string(), value.to_string());
        }
        Some(Self(key))
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn get(&self, attribute: &str) -> Option<&str> {
        self.0.get(attribute).map(String::as_str)
    }

    pub fn matches(&self, item: &Item) -> bool {
        self.attributes()
            .all(|(name, value)| item.get(name).and_then(Value::as_str) == Some(value))
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .attributes()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        f.write_str(&parts.join(","))
    }
}

/// The five per-tenant switches gating library propagation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowLibraryFlags {
    #[serde(rename(deserialize = "enableWorkflowLibraryUpdates"))]
    pub updates: bool,
    #[serde(rename(deserialize = "enableWorkflowLibraryNewContent"))]
    pub new_content: bool,
    #[serde(rename(deserialize = "enableWorkflowLibraryRemoval"))]
    pub removal: bool,
    #[serde(rename(deserialize = "enableWorkflowLibraryScheduleCreation"))]
    pub schedule_creation: bool,
    #[serde(rename(deserialize = "enableWorkflowLibraryScheduleRemoval"))]
    pub schedule_removal: bool,
}

impl WorkflowLibraryFlags {
    pub fn all_enabled() -> Self {
        Self {
            updates: true,
            new_content: true,
            removal: true,
            schedule_creation: true,
            schedule_removal: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CampaignWindows {
    pub campaign_attribution_lag_days: u32,
    pub campaign_list_database_name: String,
    pub campaign_list_table_name: String,
    pub default_workflow_execution_time_zone: String,
    pub maximum_campaign_age_days: u32,
    pub maximum_campaign_end_age_days: u32,
    pub minimum_campaign_age_days: u32,
    #[serde(flatten)]
    pub extra: Item,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusSyncSettings {
    #[serde(rename = "amcWorkflowExecutionTrackingDynamoDBTableName")]
    pub tracking_table_name: String,
    pub last_synced_time: String,
    pub latest_last_updated_time: String,
    // Attribute name is misspelled in every deployed record.
    #[serde(rename = "workflowExeuctionStatusLookBackHours")]
    pub look_back_hours: u32,
    #[serde(rename = "workflowStatusExpirationHours")]
    pub expiration_hours: u32,
    #[serde(rename = "workflowStatusExpirationTimeZone")]
    pub expiration_time_zone: String,
    #[serde(rename = "WorkflowStatusRecordRetentionDays")]
    pub record_retention_days: u32,
    #[serde(flatten)]
    pub extra: Item,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WfmSettings {
    #[serde(default)]
    pub enable_workflow_library_updates: bool,
    #[serde(default)]
    pub enable_workflow_library_new_content: bool,
    #[serde(default)]
    pub enable_workflow_library_removal: bool,
    #[serde(default)]
    pub enable_workflow_library_schedule_creation: bool,
    #[serde(default)]
    pub enable_workflow_library_schedule_removal: bool,
    #[serde(
        rename = "amcWorkflowExecutionSQSQueueName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub execution_queue_name: Option<String>,
    #[serde(
        rename = "amcWorkflowExecutionDLQSQSQueueName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub execution_dlq_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sns_topic_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_workflow_by_campaign: Option<CampaignWindows>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_workflow_statuses: Option<StatusSyncSettings>,
    #[serde(flatten)]
    pub extra: Item,
}

impl WfmSettings {
    pub fn set_flags(&mut self, flags: WorkflowLibraryFlags) {
        self.enable_workflow_library_updates = flags.updates;
        self.enable_workflow_library_new_content = flags.new_content;
        self.enable_workflow_library_removal = flags.removal;
        self.enable_workflow_library_schedule_creation = flags.schedule_creation;
        self.enable_workflow_library_schedule_removal = flags.schedule_removal;
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AmcSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amc_access_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amc_api_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amc_instance_region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amc_workflow_packages: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_concurrent_workflow_executions: Option<u32>,
    #[serde(rename = "WFM", default)]
    pub wfm: WfmSettings,
    #[serde(flatten)]
    pub extra: Item,
}

/// One tenant's record in the customer configuration table, as written at
/// provisioning time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TenantConfig {
    pub customer_id: String,
    #[serde(
        rename = "customer_hash_key",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub customer_hash_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endemic_type: Option<String>,
    #[serde(rename = "AMC", default)]
    pub amc: AmcSettings,
    #[serde(flatten)]
    pub extra: Item,
}

impl TenantConfig {
    pub fn from_item(item: Item) -> Result<Self, ValidationError> {
        let config: Self = serde_json::from_value(Value::Object(item))
            .map_err(|error| ValidationError::new(format!("Malformed tenant config: {error}")))?;
        if config.customer_id.trim().is_empty() {
            return Err(ValidationError::new("customerId cannot be empty"));
        }
        Ok(config)
    }

    pub fn to_item(&self) -> Result<Item, ValidationError> {
        match serde_json::to_value(self) {
            Ok(Value::Object(item)) => Ok(item),
            Ok(_) => Err(ValidationError::new("tenant config must serialize to an object")),
            Err(error) => Err(ValidationError::new(format!(
                "tenant config serialization failed: {error}"
            ))),
        }
    }

}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub struct ProfileSettings {
    #[serde(rename = "WFM", default)]
    pub wfm: WorkflowLibraryFlags,
}

/// The attributes of a tenant record that library propagation reads.
///
/// Every other attribute is ignored, so an operational setting stored with
/// an unexpected shape never keeps the tenant out of the roster.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TenantProfile {
    pub customer_id: String,
    #[serde(default)]
    pub customer_prefix: Option<String>,
    #[serde(default)]
    pub endemic_type: Option<String>,
    #[serde(rename = "AMC", default)]
    pub amc: ProfileSettings,
}

impl TenantProfile {
    pub fn from_item(item: Item) -> Result<Self, ValidationError> {
        let profile: Self = serde_json::from_value(Value::Object(item))
            .map_err(|error| ValidationError::new(format!("Malformed tenant config: {error}")))?;
        if profile.customer_id.trim().is_empty() {
            return Err(ValidationError::new("customerId cannot be empty"));
        }
        Ok(profile)
    }

    pub fn flags(&self) -> WorkflowLibraryFlags {
        self.amc.wfm
    }

    pub fn endemic_type(&self) -> &str {
        self.endemic_type.as_deref().unwrap_or_default()
    }

    pub fn customer_prefix(&self) -> &str {
        self.customer_prefix.as_deref().unwrap_or_default()
    }
}

/// A shared workflow template from the library table.
///
/// The item is kept verbatim; only the attributes propagation depends on
/// are validated.
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryRecord {
    item: Item,
}

impl LibraryRecord {
    pub fn from_item(item: Item) -> Result<Self, ValidationError> {
        match item.get(WORKFLOW_ID_ATTRIBUTE) {
            Some(Value::String(id)) if !id.trim().is_empty() => {}
            Some(Value::String(_)) => {
                return Err(ValidationError::new("workflowId cannot be empty"));
            }
            Some(_) => return Err(ValidationError::new("workflowId must be a string")),
            None => return Err(ValidationError::new("library record is missing workflowId")),
        }

        for attribute in [ENDEMIC_TYPE_ATTRIBUTE, CUSTOMER_PREFIX_ATTRIBUTE] {
            match item.get(attribute) {
                None | Some(Value::Null) | Some(Value::String(_)) => {}
                Some(_) => {
                    return Err(ValidationError::new(format!(
                        "{attribute} must be a string when present"
                    )));
                }
            }
        }

        match item.get(SCHEDULE_ATTRIBUTE) {
            None | Some(Value::Null) => {}
            Some(Value::Object(schedule)) => match schedule.get(SCHEDULE_NAME_ATTRIBUTE) {
                Some(Value::String(name)) if !name.trim().is_empty() => {}
                _ => {
                    return Err(ValidationError::new(
                        "schedule must carry a non-empty Name",
                    ));
                }
            },
            Some(_) => return Err(ValidationError::new("schedule must be an object")),
        }

        Ok(Self { item })
    }

    pub fn workflow_id(&self) -> &str {
        self.item
            .get(WORKFLOW_ID_ATTRIBUTE)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Endemic-type filter, `None` when absent or empty (wildcard).
    pub fn endemic_type_filter(&self) -> Option<&str> {
        self.string_filter(ENDEMIC_TYPE_ATTRIBUTE)
    }

    /// Customer-prefix filter, `None` when absent or empty (wildcard).
    pub fn customer_prefix_filter(&self) -> Option<&str> {
        self.string_filter(CUSTOMER_PREFIX_ATTRIBUTE)
    }

    pub fn schedule_name(&self) -> Option<&str> {
        self.schedule()?
            .get(SCHEDULE_NAME_ATTRIBUTE)
            .and_then(Value::as_str)
    }

    pub fn item(&self) -> &Item {
        &self.item
    }

    /// The tenant's copy of the workflow: the whole record minus its
    /// schedule, stamped with `customerId`.
    pub fn tenant_workflow(&self, customer_id: &str) -> Item {
        let mut workflow = self.item.clone();
        workflow.remove(SCHEDULE_ATTRIBUTE);
        workflow.insert(
            CUSTOMER_ID_ATTRIBUTE.to_string(),
            Value::String(customer_id.to_string()),
        );
        workflow
    }

    pub fn tenant_schedule(&self, customer_id: &str) -> Option<Item> {
        let mut schedule = self.schedule()?.clone();
        schedule.insert(
            CUSTOMER_ID_ATTRIBUTE.to_string(),
            Value::String(customer_id.to_string()),
        );
        Some(schedule)
    }

    fn schedule(&self) -> Option<&Item> {
        self.item.get(SCHEDULE_ATTRIBUTE).and_then(Value::as_object)
    }

    fn string_filter(&self, attribute: &str) -> Option<&str> {
        self.item
            .get(attribute)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventName {
    Insert,
    Modify,
    Remove,
}

impl EventName {
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value {
            "INSERT" => Ok(Self::Insert),
            "MODIFY" => Ok(Self::Modify),
            "REMOVE" => Ok(Self::Remove),
            other => Err(ValidationError::new(format!(
                "Unsupported eventName '{other}'"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Modify => "MODIFY",
            Self::Remove => "REMOVE",
        }
    }
}

impl std::fmt::Display for EventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StreamImages {
    #[serde(rename = "NewImage", default, skip_serializing_if = "Option::is_none")]
    pub new_image: Option<Map<String, Value>>,
    #[serde(rename = "OldImage", default, skip_serializing_if = "Option::is_none")]
    pub old_image: Option<Map<String, Value>>,
}

/// One DynamoDB stream record, images still in attribute-value encoding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamRecord {
    #[serde(rename = "eventName")]
    pub event_name: String,
    #[serde(rename = "eventSourceARN", default, skip_serializing_if = "Option::is_none")]
    pub event_source_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamodb: Option<StreamImages>,
}

/// Table name out of `arn:aws:dynamodb:<region>:<account>:table/<name>/stream/<ts>`.
pub fn table_name_from_arn(arn: &str) -> Option<&str> {
    arn.split('/').nth(1).filter(|name| !name.is_empty())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StackNotification {
    #[serde(rename = "stackStatus")]
    pub stack_status: String,
}

impl StackNotification {
    pub fn is_complete(&self) -> bool {
        COMPLETED_STACK_STATUSES.contains(&self.stack_status.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProvisioningEvent {
    pub body: StackNotification,
    #[serde(rename = "BucketName", default)]
    pub bucket_name: Option<String>,
    #[serde(rename = "TenantName", default)]
    pub tenant_name: Option<String>,
    #[serde(rename = "AmcDatasetName", default)]
    pub amc_dataset_name: Option<String>,
    #[serde(rename = "TenantPrefix", default)]
    pub tenant_prefix: Option<String>,
    #[serde(rename = "AmcTeamName", default)]
    pub amc_team_name: Option<String>,
    #[serde(rename = "amcApiEndpoint", default)]
    pub amc_api_endpoint: Option<String>,
    #[serde(rename = "amcRegion", default)]
    pub amc_region: Option<String>,
    #[serde(rename = "customerName", default)]
    pub customer_name: Option<String>,
    #[serde(rename = "customerType", default)]
    pub customer_type: Option<String>,
}

/// Fields required for the data-lake customer-config write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataLakeSeed<'a> {
    pub bucket_name: &'a str,
    pub tenant_name: &'a str,
    pub dataset_name: &'a str,
    pub tenant_prefix: &'a str,
    pub team_name: &'a str,
}

/// Fields required for the tenant configuration write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantSeed<'a> {
    pub api_endpoint: &'a str,
    pub region: &'a str,
    pub tenant_name: &'a str,
    pub team_name: &'a str,
    pub customer_name: &'a str,
    pub tenant_prefix: &'a str,
    pub customer_type: &'a str,
}

impl ProvisioningEvent {
    pub fn data_lake_seed(&self) -> Option<DataLakeSeed<'_>> {
        Some(DataLakeSeed {
            bucket_name: self.bucket_name.as_deref()?,
            tenant_name: self.tenant_name.as_deref()?,
            dataset_name: self.amc_dataset_name.as_deref()?,
            tenant_prefix: self.tenant_prefix.as_deref()?,
            team_name: self.amc_team_name.as_deref()?,
        })
    }

    pub fn tenant_seed(&self) -> Option<TenantSeed<'_>> {
        Some(TenantSeed {
            api_endpoint: self.amc_api_endpoint.as_deref()?,
            region: self.amc_region.as_deref()?,
            tenant_name: self.tenant_name.as_deref()?,
            team_name: self.amc_team_name.as_deref()?,
            customer_name: self.customer_name.as_deref()?,
            tenant_prefix: self.tenant_prefix.as_deref()?,
            customer_type: self.customer_type.as_deref()?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowInput {
    pub payload: Value,
}

/// A workflow execution request as stored on schedules: `{customerId, Input: {payload}}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowInvocationRequest {
    #[serde(rename = "customerId")]
    pub customer_id: String,
    #[serde(rename = "Input")]
    pub input: WorkflowInput,
}

/// Invocation of a workflow already stored for a tenant, with optional
/// payload overrides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedWorkflowInvocation {
    #[serde(rename = "customerId")]
    pub customer_id: String,
    #[serde(rename = "workflowId")]
    pub workflow_id: String,
    #[serde(default)]
    pub payload: Item,
}

/// Payload accepted by the execution queue producer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionRequest {
    #[serde(rename = "customerId")]
    pub customer_id: String,
    pub payload: Value,
}

impl From<&WorkflowInvocationRequest> for ExecutionRequest {
    fn from(request: &WorkflowInvocationRequest) -> Self {
        Self {
            customer_id: request.customer_id.clone(),
            payload: request.input.payload.clone(),
        }
    }
}
