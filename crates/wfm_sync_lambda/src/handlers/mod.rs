pub mod config_relay;
pub mod library_sync;
pub mod provisioning_seed;
pub mod workflow_invoke;
