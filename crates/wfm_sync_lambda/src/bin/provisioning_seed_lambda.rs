use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use wfm_sync_lambda::aws::DynamoRecordStore;
use wfm_sync_lambda::handlers::provisioning_seed::{handle_seed_event, SeedResponse};
use wfm_sync_lambda::observability::{init_logging, LogFormat};
use wfm_sync_lambda::settings::SeedSettings;

async fn handle_request(event: LambdaEvent<Value>) -> Result<SeedResponse, Error> {
    let settings = SeedSettings::from_env()?;

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let store = DynamoRecordStore::new(aws_sdk_dynamodb::Client::new(&aws_config));

    Ok(handle_seed_event(event.payload, &store, &settings)?)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging(LogFormat::from_env());
    lambda_runtime::run(service_fn(handle_request)).await
}
