use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use wfm_sync_lambda::adapters::config_store::ConfigStore;
use wfm_sync_lambda::aws::DynamoRecordStore;
use wfm_sync_lambda::handlers::library_sync::{handle_library_event, LibrarySyncResponse};
use wfm_sync_lambda::observability::{init_logging, LogFormat};
use wfm_sync_lambda::settings::LibrarySyncSettings;

async fn handle_request(event: LambdaEvent<Value>) -> Result<LibrarySyncResponse, Error> {
    let settings = LibrarySyncSettings::from_env()?;

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let store = DynamoRecordStore::new(aws_sdk_dynamodb::Client::new(&aws_config));
    let config_store = ConfigStore::new(&store, &settings.tables);

    Ok(handle_library_event(event.payload, &config_store)?)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging(LogFormat::from_env());
    lambda_runtime::run(service_fn(handle_request)).await
}
