use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::adapters::record_store::{DeleteCondition, RecordStore, StoreError};
use crate::runtime::contract::{Item, RecordKey, TenantProfile};

/// Tenant profiles keyed and ordered by `customerId`.
pub type TenantRoster = BTreeMap<String, TenantProfile>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowTables {
    pub customers: String,
    pub library: String,
    pub workflows: String,
    pub schedules: String,
}

/// Typed access to the customer config, library, workflow and schedule tables.
pub struct ConfigStore<'a> {
    store: &'a dyn RecordStore,
    tables: &'a WorkflowTables,
}

impl<'a> ConfigStore<'a> {
    pub fn new(store: &'a dyn RecordStore, tables: &'a WorkflowTables) -> Self {
        Self { store, tables }
    }

    pub fn tenant_configs(&self) -> Result<TenantRoster, StoreError> {
        let items = self.store.scan(&self.tables.customers)?;
        Ok(self.build_roster(items))
    }

    pub fn tenant_config(&self, customer_id: &str) -> Result<TenantRoster, StoreError> {
        let items = self
            .store
            .query(&self.tables.customers, &RecordKey::tenant(customer_id))?;
        Ok(self.build_roster(items))
    }

    pub fn library_records(&self) -> Result<Vec<Item>, StoreError> {
        self.store.scan(&self.tables.library)
    }

    pub fn workflow_exists(&self, customer_id: &str, workflow_id: &str) -> Result<bool, StoreError> {
        self.store.exists(
            &self.tables.workflows,
            &RecordKey::workflow(customer_id, workflow_id),
        )
    }

    pub fn put_workflow(&self, workflow: &Item) -> Result<(), StoreError> {
        self.store.put(&self.tables.workflows, workflow)
    }

    /// Returns `false` when the record was already gone at delete time.
    pub fn delete_workflow(&self, customer_id: &str, workflow_id: &str) -> Result<bool, StoreError> {
        let key = RecordKey::workflow(customer_id, workflow_id);
        match self
            .store
            .delete(&self.tables.workflows, &key, DeleteCondition::KeyExists)
        {
            Ok(()) => Ok(true),
            Err(error) if error.is_conditional_check_failed() => {
                debug!(table = %self.tables.workflows, key = %key, "workflow already removed");
                Ok(false)
            }
            Err(error) => Err(error),
        }
    }

    pub fn schedule_exists(&self, customer_id: &str, schedule_name: &str) -> Result<bool, StoreError> {
        self.store.exists(
            &self.tables.schedules,
            &RecordKey::schedule(customer_id, schedule_name),
        )
    }

    pub fn put_schedule(&self, schedule: &Item) -> Result<(), StoreError> {
        self.store.put(&self.tables.schedules, schedule)
    }

    pub fn delete_schedule(&self, customer_id: &str, schedule_name: &str) -> Result<(), StoreError> {
        self.store.delete(
            &self.tables.schedules,
            &RecordKey::schedule(customer_id, schedule_name),
            DeleteCondition::Unconditional,
        )
    }

    fn build_roster(&self, items: Vec<Item>) -> TenantRoster {
        let mut roster = TenantRoster::new();
        for item in items {
            match TenantProfile::from_item(item) {
                Ok(profile) => {
                    roster.insert(profile.customer_id.clone(), profile);
                }
                Err(error) => {
                    warn!(
                        table = %self.tables.customers,
                        error = %error,
                        "skipping malformed tenant config"
                    );
                }
            }
        }
        roster
    }
}
