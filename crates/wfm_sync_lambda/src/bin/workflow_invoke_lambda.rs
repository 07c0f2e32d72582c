use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use wfm_sync_lambda::adapters::invoke::InvocationAck;
use wfm_sync_lambda::aws::{DynamoRecordStore, LambdaFunctionInvoker};
use wfm_sync_lambda::handlers::workflow_invoke::handle_invocation_event;
use wfm_sync_lambda::observability::{init_logging, LogFormat};
use wfm_sync_lambda::settings::InvokeSettings;

async fn handle_request(event: LambdaEvent<Value>) -> Result<InvocationAck, Error> {
    let settings = InvokeSettings::from_env()?;

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let store = DynamoRecordStore::new(aws_sdk_dynamodb::Client::new(&aws_config));
    let invoker = LambdaFunctionInvoker::new(aws_sdk_lambda::Client::new(&aws_config));

    Ok(handle_invocation_event(
        event.payload,
        &store,
        &invoker,
        &settings,
    )?)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging(LogFormat::from_env());
    lambda_runtime::run(service_fn(handle_request)).await
}
