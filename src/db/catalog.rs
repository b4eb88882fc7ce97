use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::Table;

/// One row of the database's metadata about table nesting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub table_name: String,
    /// Structural (interleave) parent, if any
    pub parent_table_name: Option<String>,
}

impl CatalogEntry {
    pub fn root(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            parent_table_name: None,
        }
    }

    pub fn child(table_name: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            parent_table_name: Some(parent.into()),
        }
    }
}

/// The database capabilities seeding needs
#[async_trait]
pub trait Store: Send + Sync {
    /// Catalog rows for exactly the requested tables; unknown names are absent
    async fn query_catalog(&self, table_names: &[String]) -> Result<Vec<CatalogEntry>, StoreError>;

    /// Insert-or-update every record, tables in the given order, atomically
    async fn bulk_write(&self, tables: &[Table]) -> Result<(), StoreError>;
}
