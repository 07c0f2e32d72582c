pub mod config_store;
pub mod invoke;
pub mod record_store;
pub mod topic;
