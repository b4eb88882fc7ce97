use tracing::debug;

use super::catalog::CatalogEntry;
use super::pool::Pool;

/// How a text-typed parameter has to be wrapped to land in a column
///
/// YAML has no date, timestamp, numeric or JSON literals, so those arrive as
/// strings and the database needs an explicit conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextConversion {
    /// Text column, bind as-is
    Direct,
    /// `CAST($n AS <type>)`
    Cast(String),
    /// `decode($n, 'base64')` for binary columns
    Base64,
    /// Binary array columns; string lists are base64-decoded before binding
    Base64Array,
}

impl TextConversion {
    /// Classify a column from its `information_schema.columns` type
    pub fn for_column(data_type: &str, udt_name: Option<&str>) -> Self {
        let data_type = data_type.trim().to_lowercase();
        match data_type.as_str() {
            "text" | "character varying" | "varchar" | "character" | "char" | "bpchar"
            | "string" => TextConversion::Direct,
            "bytea" | "bytes" => TextConversion::Base64,
            "array" => match udt_name.map(|u| u.trim_start_matches('_')) {
                Some("text" | "varchar" | "bpchar") | None => TextConversion::Direct,
                Some("bytea" | "bytes") => TextConversion::Base64Array,
                Some(element) => TextConversion::Cast(format!("{}[]", element)),
            },
            "user-defined" => match udt_name {
                Some(udt) => TextConversion::Cast(udt.to_string()),
                None => TextConversion::Direct,
            },
            _ => TextConversion::Cast(data_type),
        }
    }

    /// Wrap a placeholder
    pub fn apply(&self, placeholder: &str) -> String {
        match self {
            TextConversion::Direct => placeholder.to_string(),
            TextConversion::Cast(sql_type) => format!("CAST({} AS {})", placeholder, sql_type),
            TextConversion::Base64 => format!("decode({}, 'base64')", placeholder),
            // Only nulls reach the placeholder as text
            TextConversion::Base64Array => format!("CAST({} AS bytea[])", placeholder),
        }
    }
}

/// A column of an existing table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub conversion: TextConversion,
}

/// What the writer needs to know about a target table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableLayout {
    pub columns: Vec<Column>,
    pub primary_key: Vec<String>,
}

impl TableLayout {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Conversion for text or null values bound into `column`
    pub fn conversion(&self, column: &str) -> TextConversion {
        self.column(column)
            .map(|c| c.conversion.clone())
            .unwrap_or(TextConversion::Direct)
    }
}

/// Query structural parents for the given tables
pub async fn query_catalog(
    pool: &Pool,
    table_names: &[String],
) -> Result<Vec<CatalogEntry>, sqlx::Error> {
    let rows = pool.fetch_catalog_rows(table_names).await?;

    Ok(rows
        .into_iter()
        .map(|(table_name, parent_table_name)| CatalogEntry {
            table_name,
            // Spanner reports root tables with an empty parent in some versions
            parent_table_name: parent_table_name.filter(|p| !p.is_empty()),
        })
        .collect())
}

/// Query columns and primary key of an existing table
pub async fn query_table_layout(pool: &Pool, table_name: &str) -> Result<TableLayout, sqlx::Error> {
    let columns = pool
        .fetch_column_rows(table_name)
        .await?
        .into_iter()
        .map(|(name, data_type, udt_name)| Column {
            conversion: TextConversion::for_column(&data_type, udt_name.as_deref()),
            name,
        })
        .collect::<Vec<_>>();

    let primary_key = pool.fetch_primary_key(table_name).await?;

    debug!(
        table = table_name,
        columns = columns.len(),
        primary_key = ?primary_key,
        "queried table layout"
    );

    Ok(TableLayout {
        columns,
        primary_key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_conversions() {
        let test_cases = [
            ("text", None, TextConversion::Direct),
            ("character varying", None, TextConversion::Direct),
            ("TEXT", None, TextConversion::Direct),
            ("bytea", None, TextConversion::Base64),
            (
                "timestamp with time zone",
                None,
                TextConversion::Cast("timestamp with time zone".to_string()),
            ),
            ("date", None, TextConversion::Cast("date".to_string())),
            ("numeric", None, TextConversion::Cast("numeric".to_string())),
            ("jsonb", None, TextConversion::Cast("jsonb".to_string())),
            ("bigint", None, TextConversion::Cast("bigint".to_string())),
            ("ARRAY", Some("_text"), TextConversion::Direct),
            ("ARRAY", Some("_varchar"), TextConversion::Direct),
            ("ARRAY", Some("_date"), TextConversion::Cast("date[]".to_string())),
            ("ARRAY", Some("_bytea"), TextConversion::Base64Array),
            (
                "ARRAY",
                Some("_timestamptz"),
                TextConversion::Cast("timestamptz[]".to_string()),
            ),
            (
                "USER-DEFINED",
                Some("mood"),
                TextConversion::Cast("mood".to_string()),
            ),
        ];

        for (data_type, udt_name, expected) in test_cases {
            assert_eq!(
                TextConversion::for_column(data_type, udt_name),
                expected,
                "data_type {} udt {:?}",
                data_type,
                udt_name
            );
        }
    }

    #[test]
    fn test_apply_conversion() {
        assert_eq!(TextConversion::Direct.apply("$1"), "$1");
        assert_eq!(
            TextConversion::Cast("date".to_string()).apply("$2"),
            "CAST($2 AS date)"
        );
        assert_eq!(TextConversion::Base64.apply("$3"), "decode($3, 'base64')");
        assert_eq!(
            TextConversion::Base64Array.apply("$4"),
            "CAST($4 AS bytea[])"
        );
    }

    #[test]
    fn test_unknown_column_is_direct() {
        let layout = TableLayout {
            columns: vec![Column {
                name: "CreatedAt".to_string(),
                conversion: TextConversion::Cast("timestamp with time zone".to_string()),
            }],
            primary_key: vec!["FooID".to_string()],
        };

        assert_eq!(layout.conversion("Missing"), TextConversion::Direct);
        assert_eq!(
            layout.conversion("CreatedAt"),
            TextConversion::Cast("timestamp with time zone".to_string())
        );
    }
}
