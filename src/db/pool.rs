//! Connection pool over the Postgres wire protocol, with a SQLite variant for tests
use derive_builder::Builder;
#[cfg(test)]
use sqlx::Row;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use tracing::info;

use super::writer::{Dialect, Upsert, bind_postgres};
#[cfg(test)]
use super::writer::{bind_sqlite, quote_identifier};
use crate::config::{CONNECT_TIMEOUT, DEFAULT_PORT, DEFAULT_USERNAME};
use crate::error::StoreError;

/// Inner pool variants
#[derive(Debug, Clone)]
enum PoolInner {
    Postgres(sqlx::PgPool),
    #[cfg(test)]
    Sqlite(sqlx::SqlitePool),
}

#[derive(Debug, Clone)]
pub struct Pool {
    inner: PoolInner,
}

#[derive(Builder)]
pub struct PoolArgs {
    #[builder(setter(into))]
    host: String,
    #[builder(default = "DEFAULT_PORT")]
    port: u16,
    /// `projects/{p}/instances/{i}/databases/{d}`
    #[builder(setter(into))]
    database: String,
    #[builder(setter(into), default = "DEFAULT_USERNAME.to_string()")]
    username: String,
    #[builder(setter(into, strip_option), default)]
    password: Option<String>,
    #[builder(default = "4")]
    max_connections: u32,
}

pub async fn pool(args: PoolArgs) -> Result<Pool, StoreError> {
    let PoolArgs {
        host,
        port,
        database,
        username,
        password,
        max_connections,
    } = args;

    let mut connect_options = PgConnectOptions::new()
        .host(&host)
        .port(port)
        .database(&database)
        .username(&username)
        // PGAdapter usually listens without TLS on localhost
        .ssl_mode(PgSslMode::Prefer);
    if let Some(password) = &password {
        connect_options = connect_options.password(password);
    }

    info!(host, port, database, "connecting");

    let pg_pool = tokio::time::timeout(
        CONNECT_TIMEOUT,
        PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(CONNECT_TIMEOUT)
            .connect_with(connect_options),
    )
    .await
    .map_err(|_| StoreError::Timeout {
        operation: "Connect",
        timeout: CONNECT_TIMEOUT,
    })??;

    Ok(Pool {
        inner: PoolInner::Postgres(pg_pool),
    })
}

impl Pool {
    /// Create an in-memory SQLite pool for testing
    ///
    /// A single connection, since every connection to `sqlite::memory:` opens
    /// its own database.
    #[cfg(test)]
    pub async fn sqlite_in_memory() -> Result<Self, sqlx::Error> {
        use std::str::FromStr;

        let options = sqlx::sqlite::SqliteConnectOptions::from_str("sqlite::memory:")?
            .foreign_keys(true);
        let sqlite_pool = sqlx::sqlite::SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Ok(Pool {
            inner: PoolInner::Sqlite(sqlite_pool),
        })
    }

    #[cfg(test)]
    pub fn as_sqlite(&self) -> Option<&sqlx::SqlitePool> {
        match &self.inner {
            PoolInner::Sqlite(pool) => Some(pool),
            PoolInner::Postgres(_) => None,
        }
    }

    pub fn dialect(&self) -> Dialect {
        match &self.inner {
            PoolInner::Postgres(_) => Dialect::Postgres,
            #[cfg(test)]
            PoolInner::Sqlite(_) => Dialect::Sqlite,
        }
    }

    /// Execute a statement without parameters (DDL and the like)
    pub async fn execute_query(&self, sql: &str) -> Result<(), sqlx::Error> {
        match &self.inner {
            PoolInner::Postgres(pool) => {
                sqlx::query(sql).execute(pool).await?;
                Ok(())
            }
            #[cfg(test)]
            PoolInner::Sqlite(pool) => {
                sqlx::query(sql).execute(pool).await?;
                Ok(())
            }
        }
    }

    /// `(table_name, parent_table_name)` for each requested table that exists
    pub async fn fetch_catalog_rows(
        &self,
        table_names: &[String],
    ) -> Result<Vec<(String, Option<String>)>, sqlx::Error> {
        match &self.inner {
            PoolInner::Postgres(pool) => {
                let sql = r#"
                    SELECT table_name, parent_table_name
                    FROM information_schema.tables
                    WHERE table_schema = 'public'
                    AND table_name = ANY($1)
                "#;
                sqlx::query_as::<_, (String, Option<String>)>(sql)
                    .bind(table_names)
                    .fetch_all(pool)
                    .await
            }
            #[cfg(test)]
            PoolInner::Sqlite(pool) => {
                // No interleaving in SQLite; the first foreign key to another
                // table stands in for the structural parent
                let mut rows = Vec::new();
                for table_name in table_names {
                    let exists: Option<(String,)> = sqlx::query_as(
                        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
                    )
                    .bind(table_name)
                    .fetch_optional(pool)
                    .await?;
                    if exists.is_none() {
                        continue;
                    }

                    let pragma_sql =
                        format!("PRAGMA foreign_key_list({})", quote_identifier(table_name));
                    let mut keys = Vec::new();
                    for row in sqlx::query(&pragma_sql).fetch_all(pool).await? {
                        let id: i64 = row.try_get("id")?;
                        let parent: String = row.try_get("table")?;
                        if &parent != table_name {
                            keys.push((id, parent));
                        }
                    }
                    keys.sort();

                    rows.push((
                        table_name.clone(),
                        keys.into_iter().next().map(|(_, parent)| parent),
                    ));
                }
                Ok(rows)
            }
        }
    }

    /// `(column_name, data_type, udt_name)` in column order
    pub async fn fetch_column_rows(
        &self,
        table_name: &str,
    ) -> Result<Vec<(String, String, Option<String>)>, sqlx::Error> {
        match &self.inner {
            PoolInner::Postgres(pool) => {
                let sql = r#"
                    SELECT column_name, data_type, udt_name
                    FROM information_schema.columns
                    WHERE table_schema = 'public'
                    AND table_name = $1
                    ORDER BY ordinal_position
                "#;
                sqlx::query_as::<_, (String, String, Option<String>)>(sql)
                    .bind(table_name)
                    .fetch_all(pool)
                    .await
            }
            #[cfg(test)]
            PoolInner::Sqlite(pool) => {
                let pragma_sql = format!("PRAGMA table_info({})", quote_identifier(table_name));
                let mut columns = Vec::new();
                for row in sqlx::query(&pragma_sql).fetch_all(pool).await? {
                    let name: String = row.try_get("name")?;
                    let data_type: String = row.try_get("type")?;
                    columns.push((name, data_type, None));
                }
                Ok(columns)
            }
        }
    }

    /// Primary-key column names in key order
    pub async fn fetch_primary_key(&self, table_name: &str) -> Result<Vec<String>, sqlx::Error> {
        match &self.inner {
            PoolInner::Postgres(pool) => {
                let sql = r#"
                    SELECT kcu.column_name
                    FROM information_schema.table_constraints tc
                    JOIN information_schema.key_column_usage kcu
                      ON tc.constraint_name = kcu.constraint_name
                     AND tc.table_schema = kcu.table_schema
                     AND tc.table_name = kcu.table_name
                    WHERE tc.constraint_type = 'PRIMARY KEY'
                    AND tc.table_schema = 'public'
                    AND tc.table_name = $1
                    ORDER BY kcu.ordinal_position
                "#;
                let rows: Vec<(String,)> = sqlx::query_as(sql)
                    .bind(table_name)
                    .fetch_all(pool)
                    .await?;
                Ok(rows.into_iter().map(|(name,)| name).collect())
            }
            #[cfg(test)]
            PoolInner::Sqlite(pool) => {
                let pragma_sql = format!("PRAGMA table_info({})", quote_identifier(table_name));
                let mut keys = Vec::new();
                for row in sqlx::query(&pragma_sql).fetch_all(pool).await? {
                    // 0 for non-key columns, else the 1-based position in the key
                    let position: i64 = row.try_get("pk")?;
                    if position > 0 {
                        keys.push((position, row.try_get::<String, _>("name")?));
                    }
                }
                keys.sort();
                Ok(keys.into_iter().map(|(_, name)| name).collect())
            }
        }
    }

    /// Run every upsert inside one transaction, returning rows affected
    ///
    /// Nothing is committed unless every statement succeeds.
    pub async fn apply_upserts(&self, upserts: &[Upsert]) -> Result<u64, sqlx::Error> {
        let dialect = self.dialect();
        let mut rows_affected = 0;

        match &self.inner {
            PoolInner::Postgres(pool) => {
                let mut tx = pool.begin().await?;
                for upsert in upserts {
                    let sql = upsert.sql(dialect);
                    let mut query = sqlx::query(&sql);
                    for value in upsert.values() {
                        query = bind_postgres(query, value);
                    }
                    rows_affected += query.execute(&mut *tx).await?.rows_affected();
                }
                tx.commit().await?;
            }
            #[cfg(test)]
            PoolInner::Sqlite(pool) => {
                let mut tx = pool.begin().await?;
                for upsert in upserts {
                    let sql = upsert.sql(dialect);
                    let mut query = sqlx::query(&sql);
                    for value in upsert.values() {
                        query = bind_sqlite(query, value);
                    }
                    rows_affected += query.execute(&mut *tx).await?.rows_affected();
                }
                tx.commit().await?;
            }
        }

        Ok(rows_affected)
    }
}
