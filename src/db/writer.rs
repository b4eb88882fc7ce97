//! Insert-or-update statements for seed records
use sqlx::Postgres;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;

use super::schema::{TableLayout, TextConversion};
use crate::formats::literal::decode_base64;
use crate::model::{Array, Record, Table, Value};

/// SQL flavour of the connected database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Sqlite,
}

/// Double-quote an identifier, doubling embedded quotes
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// One record written as insert-or-update
#[derive(Debug, Clone, PartialEq)]
pub struct Upsert {
    table: String,
    columns: Vec<String>,
    conversions: Vec<TextConversion>,
    values: Vec<Value>,
    primary_key: Vec<String>,
}

impl Upsert {
    pub fn new(layout: &TableLayout, table: &str, record: &Record) -> Self {
        let mut columns = Vec::with_capacity(record.len());
        let mut conversions = Vec::with_capacity(record.len());
        let mut values = Vec::with_capacity(record.len());

        for (column, value) in record.iter() {
            let conversion = layout.conversion(column);
            values.push(match (&conversion, value) {
                (TextConversion::Base64Array, Value::Array(Array::String(items))) => {
                    decode_base64_items(items).unwrap_or_else(|| value.clone())
                }
                _ => value.clone(),
            });
            columns.push(column.to_string());
            conversions.push(conversion);
        }

        Self {
            table: table.to_string(),
            columns,
            conversions,
            values,
            primary_key: layout.primary_key.clone(),
        }
    }

    /// Values in placeholder order
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// `INSERT ... ON CONFLICT (pk) DO UPDATE SET ...`
    ///
    /// Without a primary key this is a plain insert. When every written column
    /// is part of the key there is nothing to update and conflicts are ignored.
    pub fn sql(&self, dialect: Dialect) -> String {
        let table = quote_identifier(&self.table);

        if self.columns.is_empty() {
            return format!("INSERT INTO {} DEFAULT VALUES", table);
        }

        let columns: Vec<String> = self.columns.iter().map(|c| quote_identifier(c)).collect();
        let placeholders: Vec<String> = (0..self.values.len())
            .map(|index| self.placeholder(dialect, index))
            .collect();

        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            columns.join(", "),
            placeholders.join(", ")
        );

        if self.primary_key.is_empty() {
            return sql;
        }

        let conflict_target: Vec<String> = self
            .primary_key
            .iter()
            .map(|c| quote_identifier(c))
            .collect();
        let assignments: Vec<String> = self
            .columns
            .iter()
            .filter(|c| !self.primary_key.contains(*c))
            .map(|c| {
                let column = quote_identifier(c);
                format!("{} = EXCLUDED.{}", column, column)
            })
            .collect();

        sql.push_str(&format!(" ON CONFLICT ({})", conflict_target.join(", ")));
        if assignments.is_empty() {
            sql.push_str(" DO NOTHING");
        } else {
            sql.push_str(&format!(" DO UPDATE SET {}", assignments.join(", ")));
        }
        sql
    }

    fn placeholder(&self, dialect: Dialect, index: usize) -> String {
        match dialect {
            // SQLite has dynamic typing, so text goes in unconverted
            Dialect::Sqlite => "?".to_string(),
            Dialect::Postgres => {
                let placeholder = format!("${}", index + 1);
                let conversion = &self.conversions[index];
                match &self.values[index] {
                    Value::String(_) | Value::Null => conversion.apply(&placeholder),
                    // Lists left undecoded for a binary array column go in as
                    // text[] so the database rejects them
                    Value::Array(Array::String(_)) => match conversion {
                        TextConversion::Cast(_) => conversion.apply(&placeholder),
                        _ => placeholder,
                    },
                    _ => placeholder,
                }
            }
        }
    }
}

/// Decode every element of a string list, or `None` if any element is not base64
fn decode_base64_items(items: &[Option<String>]) -> Option<Value> {
    let bytes = items
        .iter()
        .map(|item| match item {
            Some(encoded) => decode_base64(encoded).map(Some),
            None => Some(None),
        })
        .collect::<Option<Vec<_>>>()?;
    Some(Value::Array(Array::Bytes(bytes)))
}

/// One upsert per record, tables in the given order
///
/// `layouts` must line up with `tables`.
pub fn plan_upserts(tables: &[Table], layouts: &[TableLayout]) -> Vec<Upsert> {
    tables
        .iter()
        .zip(layouts)
        .flat_map(|(table, layout)| {
            table
                .records
                .iter()
                .map(move |record| Upsert::new(layout, &table.name, record))
        })
        .collect()
}

pub fn bind_postgres<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &Value,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        // Untyped nulls are sent as text and converted like strings
        Value::Null => query.bind(None::<String>),
        Value::Bool(v) => query.bind(*v),
        Value::Int64(v) => query.bind(*v),
        Value::Float64(v) => query.bind(*v),
        Value::String(v) => query.bind(v.clone()),
        Value::Bytes(v) => query.bind(v.clone()),
        Value::Array(Array::Bool(v)) => query.bind(v.clone()),
        Value::Array(Array::Int64(v)) => query.bind(v.clone()),
        Value::Array(Array::Float64(v)) => query.bind(v.clone()),
        Value::Array(Array::String(v)) => query.bind(v.clone()),
        Value::Array(Array::Bytes(v)) => query.bind(v.clone()),
    }
}

/// SQLite has no array type; arrays are stored as JSON text
#[cfg(test)]
pub fn bind_sqlite<'q>(
    query: Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    value: &Value,
) -> Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(v) => query.bind(*v),
        Value::Int64(v) => query.bind(*v),
        Value::Float64(v) => query.bind(*v),
        Value::String(v) => query.bind(v.clone()),
        Value::Bytes(v) => query.bind(v.clone()),
        Value::Array(array) => query.bind(array_json(array)),
    }
}

#[cfg(test)]
fn array_json(array: &Array) -> String {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    let json = match array {
        Array::Bool(v) => serde_json::json!(v),
        Array::Int64(v) => serde_json::json!(v),
        Array::Float64(v) => serde_json::json!(v),
        Array::String(v) => serde_json::json!(v),
        Array::Bytes(v) => serde_json::json!(
            v.iter()
                .map(|item| item.as_ref().map(|bytes| STANDARD.encode(bytes)))
                .collect::<Vec<_>>()
        ),
    };
    json.to_string()
}
