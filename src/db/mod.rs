//! Database layer - catalog queries, dependency ordering and bulk writes

pub mod catalog;
pub mod dependency;
#[cfg(test)]
pub(crate) mod memory;
pub mod pool;
pub mod schema;
pub mod writer;

use async_trait::async_trait;
use tracing::{debug, info};

pub use catalog::{CatalogEntry, Store};
pub use dependency::{sort_by_dependencies, sort_with_store};
pub use pool::Pool;

use crate::config::{QUERY_TIMEOUT, WRITE_TIMEOUT};
use crate::error::StoreError;
use crate::model::Table;

#[async_trait]
impl Store for Pool {
    async fn query_catalog(&self, table_names: &[String]) -> Result<Vec<CatalogEntry>, StoreError> {
        let entries = tokio::time::timeout(QUERY_TIMEOUT, schema::query_catalog(self, table_names))
            .await
            .map_err(|_| StoreError::Timeout {
                operation: "Catalog query",
                timeout: QUERY_TIMEOUT,
            })??;

        debug!(
            requested = table_names.len(),
            found = entries.len(),
            "queried catalog"
        );
        Ok(entries)
    }

    async fn bulk_write(&self, tables: &[Table]) -> Result<(), StoreError> {
        let write = async {
            let mut layouts = Vec::with_capacity(tables.len());
            for table in tables {
                layouts.push(schema::query_table_layout(self, &table.name).await?);
            }

            let upserts = writer::plan_upserts(tables, &layouts);
            self.apply_upserts(&upserts).await
        };

        let rows_affected = tokio::time::timeout(WRITE_TIMEOUT, write)
            .await
            .map_err(|_| StoreError::Timeout {
                operation: "Bulk write",
                timeout: WRITE_TIMEOUT,
            })??;

        info!(
            tables = tables.len(),
            rows_affected, "committed bulk write"
        );
        Ok(())
    }
}
