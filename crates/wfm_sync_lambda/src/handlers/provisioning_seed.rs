use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::adapters::record_store::{RecordStore, StoreError};
use crate::error::HandlerError;
use crate::runtime::contract::{
    AmcSettings, CampaignWindows, DataLakeSeed, Item, ProvisioningEvent, StatusSyncSettings,
    TenantConfig, TenantSeed, WfmSettings, WorkflowLibraryFlags,
};
use crate::runtime::naming::{
    data_lake_customer_config_table, notification_topic_arn, resource_name, ResourceKind,
};
use crate::settings::SeedSettings;

pub const SKIP_MESSAGE: &str = "Skipping Metadata Update in DDB";

const ACCESS_CATEGORY: &str = "EXTERNAL";
const MAX_CONCURRENT_EXECUTIONS: u32 = 10;
const DEFAULT_TIME_ZONE: &str = "America/New_York";

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WriteOutcome {
    Written,
    AlreadySeeded,
    SkippedMissingFields,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum SeedResponse {
    Skipped(String),
    Seeded {
        data_lake: WriteOutcome,
        tenant_config: WriteOutcome,
    },
}

/// Accepts the notification either as-is or API-Gateway style with a
/// string `body`.
fn normalize_event(mut event: Value) -> Result<ProvisioningEvent, HandlerError> {
    let Some(object) = event.as_object_mut() else {
        return Err(HandlerError::InvalidEvent(
            "provisioning event must be a JSON object".to_string(),
        ));
    };

    if let Some(Value::String(text)) = object.get("body") {
        let body: Value = serde_json::from_str(text)
            .map_err(|error| HandlerError::InvalidEvent(format!("Malformed JSON body: {error}")))?;
        object.insert("body".to_string(), body);
    }

    serde_json::from_value(event)
        .map_err(|error| HandlerError::InvalidEvent(format!("Malformed provisioning event: {error}")))
}

pub fn data_lake_item(seed: &DataLakeSeed<'_>) -> Item {
    [
        ("hash_key", seed.bucket_name),
        ("customer_hash_key", seed.tenant_name),
        ("dataset", seed.dataset_name),
        ("prefix", seed.tenant_prefix),
        ("team", seed.team_name),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
    .collect()
}

/// Full tenant configuration with the onboarding defaults.
pub fn tenant_config_record(seed: &TenantSeed<'_>, settings: &SeedSettings) -> TenantConfig {
    let team = seed.team_name;
    let env = settings.env.as_str();
    let tenant = seed.tenant_name;

    let mut wfm = WfmSettings {
        execution_queue_name: Some(resource_name(team, env, ResourceKind::ExecutionQueue { tenant })),
        execution_dlq_name: Some(resource_name(
            team,
            env,
            ResourceKind::ExecutionDeadLetterQueue { tenant },
        )),
        sns_topic_arn: Some(notification_topic_arn(
            &settings.region,
            &settings.account_id,
            team,
            env,
        )),
        run_workflow_by_campaign: Some(CampaignWindows {
            campaign_attribution_lag_days: 14,
            campaign_list_database_name: resource_name(team, env, ResourceKind::CampaignListDatabase),
            campaign_list_table_name: resource_name(
                team,
                env,
                ResourceKind::CampaignListTable { tenant },
            ),
            default_workflow_execution_time_zone: DEFAULT_TIME_ZONE.to_string(),
            maximum_campaign_age_days: 90,
            maximum_campaign_end_age_days: 18,
            minimum_campaign_age_days: 3,
            extra: Item::new(),
        }),
        sync_workflow_statuses: Some(StatusSyncSettings {
            tracking_table_name: resource_name(team, env, ResourceKind::ExecutionStatusTable),
            last_synced_time: "2021-06-02T15:58:21".to_string(),
            latest_last_updated_time: "2021-06-02T15:41:17Z".to_string(),
            look_back_hours: 72,
            expiration_hours: 72,
            expiration_time_zone: DEFAULT_TIME_ZONE.to_string(),
            record_retention_days: 90,
            extra: Item::new(),
        }),
        ..WfmSettings::default()
    };
    wfm.set_flags(WorkflowLibraryFlags::all_enabled());

    TenantConfig {
        customer_id: tenant.to_string(),
        customer_hash_key: Some(tenant.to_string()),
        customer_name: Some(seed.customer_name.to_string()),
        customer_prefix: Some(seed.tenant_prefix.to_string()),
        endemic_type: Some(seed.customer_type.to_string()),
        amc: AmcSettings {
            amc_access_category: Some(ACCESS_CATEGORY.to_string()),
            amc_api_endpoint: Some(seed.api_endpoint.to_string()),
            amc_instance_region: Some(seed.region.to_string()),
            amc_workflow_packages: Some(tenant.to_string()),
            maximum_concurrent_workflow_executions: Some(MAX_CONCURRENT_EXECUTIONS),
            wfm,
            ..AmcSettings::default()
        },
        ..TenantConfig::default()
    }
}

fn write(store: &dyn RecordStore, table: &str, item: &Item) -> Result<WriteOutcome, StoreError> {
    match store.put(table, item) {
        Ok(()) => {
            info!(table, "seed record written");
            Ok(WriteOutcome::Written)
        }
        Err(error) if error.is_conditional_check_failed() => {
            info!(table, error = %error, "seed record already present");
            Ok(WriteOutcome::AlreadySeeded)
        }
        Err(error) => Err(error),
    }
}

pub fn seed(
    event: &ProvisioningEvent,
    store: &dyn RecordStore,
    settings: &SeedSettings,
) -> Result<SeedResponse, HandlerError> {
    let stack_status = event.body.stack_status.as_str();
    if !event.body.is_complete() {
        info!(stack_status, "{}", SKIP_MESSAGE);
        return Ok(SeedResponse::Skipped(SKIP_MESSAGE.to_string()));
    }
    info!(stack_status, "updating provisioning metadata");

    let data_lake = match event.data_lake_seed() {
        Some(seed) => {
            let table = data_lake_customer_config_table(&settings.prefix, &settings.env);
            write(store, &table, &data_lake_item(&seed))?
        }
        None => {
            warn!("skipping data-lake customer config, required fields missing");
            WriteOutcome::SkippedMissingFields
        }
    };

    let tenant_config = match event.tenant_seed() {
        Some(seed) => {
            let table = resource_name(seed.team_name, &settings.env, ResourceKind::CustomerConfigTable);
            let item = tenant_config_record(&seed, settings).to_item()?;
            write(store, &table, &item)?
        }
        None => {
            warn!("skipping tenant config, required fields missing");
            WriteOutcome::SkippedMissingFields
        }
    };

    Ok(SeedResponse::Seeded {
        data_lake,
        tenant_config,
    })
}

pub fn handle_seed_event(
    event: Value,
    store: &dyn RecordStore,
    settings: &SeedSettings,
) -> Result<SeedResponse, HandlerError> {
    let event = normalize_event(event)?;
    seed(&event, store, settings)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::InMemoryRecordStore;

    const TENANT_TABLE: &str = "wfm-ats-CustomerConfig-dev";
    const DATA_LAKE_TABLE: &str = "ddk-data-lake-customer-config-dev";

    fn settings() -> SeedSettings {
        SeedSettings {
            prefix: "ddk".to_string(),
            env: "dev".to_string(),
            region: "us-east-1".to_string(),
            account_id: "123456789012".to_string(),
        }
    }

    fn store() -> InMemoryRecordStore {
        InMemoryRecordStore::default()
            .with_table(TENANT_TABLE, &["customerId"])
            .with_data_lake_table(DATA_LAKE_TABLE)
    }

    fn wfm_event(stack_status: &str) -> Value {
        json!({
            "body": {"stackStatus": stack_status},
            "TenantName": "acme",
            "TenantPrefix": "ac",
            "AmcTeamName": "ats",
            "amcApiEndpoint": "https://amc.example.com/prod",
            "amcRegion": "us-east-1",
            "customerName": "Acme Corp",
            "customerType": "retail"
        })
    }

    #[test]
    fn create_complete_writes_one_tenant_config() {
        let store = store();

        let response = handle_seed_event(wfm_event("CREATE_COMPLETE"), &store, &settings())
            .expect("seed should succeed");

        assert_eq!(
            response,
            SeedResponse::Seeded {
                data_lake: WriteOutcome::SkippedMissingFields,
                tenant_config: WriteOutcome::Written,
            }
        );
        let writes = store.puts_to(TENANT_TABLE);
        assert_eq!(writes.len(), 1);
        assert_eq!(store.calls().len(), 1);

        let record = &writes[0];
        assert_eq!(record["customerId"], json!("acme"));
        assert_eq!(record["customer_hash_key"], json!("acme"));
        assert_eq!(record["endemicType"], json!("retail"));
        assert_eq!(record["AMC"]["amcWorkflowPackages"], json!("acme"));
        assert_eq!(record["AMC"]["maximumConcurrentWorkflowExecutions"], json!(10));

        let wfm = &record["AMC"]["WFM"];
        assert_eq!(
            wfm["amcWorkflowExecutionSQSQueueName"],
            json!("wfm-ats-dev-workflowExecution-acme.fifo")
        );
        assert_eq!(
            wfm["amcWorkflowExecutionDLQSQSQueueName"],
            json!("wfm-ats-dev-workflowExecution-acme-DLQ.fifo")
        );
        assert_eq!(
            wfm["snsTopicArn"],
            json!("arn:aws:sns:us-east-1:123456789012:wfm-ats-SNSTopic-dev")
        );
        assert_eq!(wfm["enableWorkflowLibraryScheduleRemoval"], json!(true));
        assert_eq!(
            wfm["runWorkflowByCampaign"]["campaignListTableName"],
            json!("acme_active_campaigns_advertisers_v1_adhoc")
        );
        assert_eq!(
            wfm["syncWorkflowStatuses"]["amcWorkflowExecutionTrackingDynamoDBTableName"],
            json!("wfm-ats-AMCExecutionStatus-dev")
        );
        assert_eq!(
            wfm["syncWorkflowStatuses"]["workflowExeuctionStatusLookBackHours"],
            json!(72)
        );
    }

    #[test]
    fn rollback_failed_skips_all_writes() {
        let store = store();

        let response = handle_seed_event(wfm_event("ROLLBACK_FAILED"), &store, &settings())
            .expect("skip should succeed");

        assert_eq!(response, SeedResponse::Skipped(SKIP_MESSAGE.to_string()));
        assert_eq!(serde_json::to_value(&response).expect("serializable"), json!(SKIP_MESSAGE));
        assert!(store.calls().is_empty());
    }

    #[test]
    fn data_lake_record_written_when_dataset_fields_present() {
        let store = store();
        let mut event = wfm_event("UPDATE_COMPLETE");
        event["BucketName"] = json!("ddk-dev-raw");
        event["AmcDatasetName"] = json!("amcdataset");

        handle_seed_event(event, &store, &settings()).expect("seed should succeed");

        assert_eq!(
            store.puts_to(DATA_LAKE_TABLE),
            vec![data_lake_item(&DataLakeSeed {
                bucket_name: "ddk-dev-raw",
                tenant_name: "acme",
                dataset_name: "amcdataset",
                tenant_prefix: "ac",
                team_name: "ats",
            })]
        );
    }

    #[test]
    fn data_lake_item_carries_every_seed_field() {
        let record = data_lake_item(&DataLakeSeed {
            bucket_name: "ddk-dev-raw",
            tenant_name: "acme",
            dataset_name: "amcdataset",
            tenant_prefix: "ac",
            team_name: "ats",
        });

        assert_eq!(
            Value::Object(record),
            json!({
                "hash_key": "ddk-dev-raw",
                "customer_hash_key": "acme",
                "dataset": "amcdataset",
                "prefix": "ac",
                "team": "ats"
            })
        );
    }

    #[test]
    fn conflict_is_reported_as_already_seeded() {
        let store = store().conflicting_on(TENANT_TABLE);

        let response = handle_seed_event(wfm_event("CREATE_COMPLETE"), &store, &settings())
            .expect("conflict should not fail");

        assert_eq!(
            response,
            SeedResponse::Seeded {
                data_lake: WriteOutcome::SkippedMissingFields,
                tenant_config: WriteOutcome::AlreadySeeded,
            }
        );
    }

    #[test]
    fn other_store_errors_propagate() {
        let store = InMemoryRecordStore::default();

        let error = handle_seed_event(wfm_event("CREATE_COMPLETE"), &store, &settings())
            .expect_err("missing table should fail");
        assert!(matches!(error, HandlerError::Store(_)));
    }

    #[test]
    fn string_body_is_parsed() {
        let store = store();
        let mut event = wfm_event("CREATE_COMPLETE");
        event["body"] = json!("{\"stackStatus\":\"CREATE_COMPLETE\"}");

        handle_seed_event(event, &store, &settings()).expect("seed should succeed");

        assert_eq!(store.puts_to(TENANT_TABLE).len(), 1);
    }

    #[test]
    fn malformed_string_body_is_rejected() {
        let error = handle_seed_event(json!({"body": "{not json"}), &store(), &settings())
            .expect_err("bad body should fail");
        assert!(error.to_string().contains("Malformed JSON body"));
    }
}
