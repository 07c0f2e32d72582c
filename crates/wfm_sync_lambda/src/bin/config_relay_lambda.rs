use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use wfm_sync_lambda::aws::SnsTopicPublisher;
use wfm_sync_lambda::handlers::config_relay::{handle_relay_event, RelayResponse};
use wfm_sync_lambda::observability::{init_logging, LogFormat};
use wfm_sync_lambda::settings::RelaySettings;

async fn handle_request(event: LambdaEvent<Value>) -> Result<RelayResponse, Error> {
    let settings = RelaySettings::from_env()?;

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let publisher = SnsTopicPublisher::new(aws_sdk_sns::Client::new(&aws_config));

    Ok(handle_relay_event(&event.payload, &publisher, &settings)?)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging(LogFormat::from_env());
    lambda_runtime::run(service_fn(handle_request)).await
}
