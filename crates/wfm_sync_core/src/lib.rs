//! Shared workflow-management propagation primitives.
//!
//! This crate owns the record and event contracts, DynamoDB attribute-value
//! decoding, change classification, tenant eligibility rules and resource
//! naming. It intentionally excludes AWS SDK and Lambda runtime concerns.

pub mod attribute_value;
pub mod change;
pub mod contract;
pub mod eligibility;
pub mod naming;
