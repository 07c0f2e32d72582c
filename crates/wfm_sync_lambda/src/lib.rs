//! AWS-oriented adapters and handlers for workflow-management propagation.
//!
//! This crate owns runtime integration details (Lambda handlers, DynamoDB,
//! SNS and Lambda adapters, environment settings, logging) and re-exports
//! the domain primitives of `wfm_sync_core` under `runtime`.

pub mod adapters;
pub mod aws;
pub mod error;
pub mod handlers;
pub mod observability;
pub mod settings;

pub mod runtime {
    pub use wfm_sync_core::{attribute_value, change, contract, eligibility, naming};
}

#[cfg(test)]
pub(crate) mod testing;
