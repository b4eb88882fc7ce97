//! Error types for loading, sorting and writing seed data
//!
//! Every error is terminal for the current run. Messages name the file,
//! record, column or table involved; the underlying cause is kept as the
//! error source.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// A parsed literal that cannot be turned into a store value
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizeError {
    /// Unsigned integer above `i64::MAX`; the store has no unsigned 64-bit type
    #[error("Unsigned value {value} does not fit in a signed 64-bit integer")]
    ValueRange { value: u64 },

    /// Mixed element kinds, nested containers, or an empty list
    #[error("Unsupported list: {reason}")]
    UnsupportedListType { reason: String },

    #[error("Unsupported value type: {kind}")]
    UnsupportedValueType { kind: String },
}

/// Malformed structured data
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    /// 1-based line of the offending token, when the parser knows it
    pub line: Option<usize>,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("{}: record {record} has non-string key {key}", path.display())]
    InvalidKey {
        path: PathBuf,
        record: usize,
        key: String,
    },

    #[error("{}: record {record}, column '{column}'", path.display())]
    Normalize {
        path: PathBuf,
        record: usize,
        column: String,
        #[source]
        source: NormalizeError,
    },

    #[error(
        "Table '{name}' is defined by both {} and {}",
        first.display(),
        second.display()
    )]
    DuplicateTable {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },
}

/// Failures of the database behind a `Store`
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error("{operation} timed out after {} seconds", timeout.as_secs())]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },
}

#[derive(Debug, Error)]
pub enum SortError {
    #[error("Failed to fetch table catalog")]
    CatalogFetch(#[source] StoreError),

    #[error("Cyclic parent relationship starting at '{table}': {}", chain.join(" -> "))]
    CyclicDependency { table: String, chain: Vec<String> },
}

/// Failure of a complete seeding run
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to load seed files")]
    Load(#[from] LoadError),

    #[error("Failed to connect to the database")]
    Connect(#[source] StoreError),

    #[error("Failed to order tables by dependencies")]
    Sort(#[from] SortError),

    #[error("Failed to write records")]
    Write(#[source] StoreError),
}

/// Invalid command-line configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Missing required options: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("Invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_normalize_error_is_source_of_load_error() {
        let err = LoadError::Normalize {
            path: PathBuf::from("seeds/Foo.yaml"),
            record: 2,
            column: "Count".to_string(),
            source: NormalizeError::ValueRange { value: u64::MAX },
        };

        assert_eq!(err.to_string(), "seeds/Foo.yaml: record 2, column 'Count'");
        let source = err.source().unwrap().to_string();
        assert!(source.contains("18446744073709551615"));
    }

    #[test]
    fn test_cycle_message_lists_chain() {
        let err = SortError::CyclicDependency {
            table: "X".to_string(),
            chain: vec!["X".to_string(), "Y".to_string(), "X".to_string()],
        };

        assert_eq!(
            err.to_string(),
            "Cyclic parent relationship starting at 'X': X -> Y -> X"
        );
    }
}
