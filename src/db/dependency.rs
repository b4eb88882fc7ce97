//! Ordering tables so that structural parents are written before children
//!
//! Each table's ancestor depth is the number of parent hops that stay inside
//! the set of tables being seeded. Tables are then stably sorted by depth, so
//! tables of equal depth keep their discovery order. This models single-parent
//! nesting (interleaving), not arbitrary foreign-key graphs.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use super::catalog::{CatalogEntry, Store};
use crate::error::SortError;
use crate::model::Table;

/// Fetch the catalog for `tables` from `store` and reorder them in place
pub async fn sort_with_store<S>(store: &S, tables: &mut [Table]) -> Result<(), SortError>
where
    S: Store + ?Sized,
{
    let table_names: Vec<String> = tables.iter().map(|t| t.name.clone()).collect();
    let catalog = store
        .query_catalog(&table_names)
        .await
        .map_err(SortError::CatalogFetch)?;

    debug!(
        "Fetched {} catalog rows for {} tables",
        catalog.len(),
        tables.len()
    );

    sort_by_dependencies(tables, &catalog)
}

/// Stably reorder `tables` by ascending ancestor depth
///
/// Catalog rows for tables outside `tables` are ignored, and a parent outside
/// `tables` ends the walk. Tables without a catalog row have depth 0.
pub fn sort_by_dependencies(
    tables: &mut [Table],
    catalog: &[CatalogEntry],
) -> Result<(), SortError> {
    let present: HashSet<&str> = tables.iter().map(|t| t.name.as_str()).collect();
    let parents: HashMap<&str, Option<&str>> = catalog
        .iter()
        .filter(|entry| present.contains(entry.table_name.as_str()))
        .map(|entry| {
            (
                entry.table_name.as_str(),
                entry.parent_table_name.as_deref(),
            )
        })
        .collect();

    let mut depths: HashMap<String, usize> = HashMap::with_capacity(parents.len());
    for table in parents.keys() {
        depths.insert(table.to_string(), ancestor_depth(table, &parents)?);
    }

    // sort_by_key is stable
    tables.sort_by_key(|t| depths.get(&t.name).copied().unwrap_or(0));

    info!(
        "Table write order: {}",
        tables
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(())
}

/// Count parent hops from `table` within `parents`
///
/// Walks iteratively with a visited set, so a cycle in the parent links is
/// reported instead of looping forever.
pub fn ancestor_depth(table: &str, parents: &HashMap<&str, Option<&str>>) -> Result<usize, SortError> {
    let mut chain = vec![table];
    let mut visited: HashSet<&str> = HashSet::from([table]);
    let mut current = table;

    while let Some(&Some(parent)) = parents.get(current) {
        if !parents.contains_key(parent) {
            // Parent is not being seeded (e.g. a system table)
            break;
        }
        chain.push(parent);
        if !visited.insert(parent) {
            return Err(SortError::CyclicDependency {
                table: table.to_string(),
                chain: chain.into_iter().map(str::to_string).collect(),
            });
        }
        current = parent;
    }

    Ok(chain.len() - 1)
}
