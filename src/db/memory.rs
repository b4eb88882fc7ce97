//! In-memory `Store` for unit tests

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::catalog::{CatalogEntry, Store};
use crate::error::StoreError;
use crate::model::Table;

#[derive(Default)]
pub struct MemoryStore {
    catalog: Vec<CatalogEntry>,
    fail_catalog: bool,
    catalog_requests: Mutex<Vec<Vec<String>>>,
    writes: Mutex<Vec<Vec<Table>>>,
}

impl MemoryStore {
    pub fn with_catalog(catalog: Vec<CatalogEntry>) -> Self {
        Self {
            catalog,
            ..Default::default()
        }
    }

    pub fn failing_catalog() -> Self {
        Self {
            fail_catalog: true,
            ..Default::default()
        }
    }

    pub fn catalog_requests(&self) -> Vec<Vec<String>> {
        self.catalog_requests.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<Vec<Table>> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn query_catalog(&self, table_names: &[String]) -> Result<Vec<CatalogEntry>, StoreError> {
        self.catalog_requests
            .lock()
            .unwrap()
            .push(table_names.to_vec());

        if self.fail_catalog {
            return Err(StoreError::Timeout {
                operation: "Catalog query",
                timeout: Duration::from_secs(1),
            });
        }

        Ok(self
            .catalog
            .iter()
            .filter(|entry| table_names.contains(&entry.table_name))
            .cloned()
            .collect())
    }

    async fn bulk_write(&self, tables: &[Table]) -> Result<(), StoreError> {
        self.writes.lock().unwrap().push(tables.to_vec());
        Ok(())
    }
}
