//! Loading seed tables from a directory of data files

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::LoadError;
use crate::formats::{Literal, RawRecord, StructuredDocumentParser, YamlParser, normalize};
use crate::io::discover_files;
use crate::model::{Record, Table};

/// Loads every data file under a directory into one table per file
pub struct Loader<P = YamlParser> {
    parser: P,
}

impl Loader<YamlParser> {
    pub fn new() -> Self {
        Self::with_parser(YamlParser::new())
    }
}

impl Default for Loader<YamlParser> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: StructuredDocumentParser> Loader<P> {
    pub fn with_parser(parser: P) -> Self {
        Self { parser }
    }

    /// Load all tables under `root`
    ///
    /// Tables come back in discovery order (depth-first, by file name). Any
    /// error aborts the whole load.
    pub async fn load(&self, root: impl AsRef<Path>) -> Result<Vec<Table>, LoadError> {
        let root = root.as_ref();
        let files = discover_files(root, self.parser.extensions())
            .await
            .map_err(|source| LoadError::Io {
                path: root.to_path_buf(),
                source,
            })?;

        info!("Found {} seed files under {}", files.len(), root.display());

        let mut sources: HashMap<String, PathBuf> = HashMap::new();
        let mut tables = Vec::with_capacity(files.len());

        for path in files {
            let table = self.load_file(&path).await?;

            if let Some(first) = sources.get(&table.name) {
                return Err(LoadError::DuplicateTable {
                    name: table.name,
                    first: first.clone(),
                    second: path,
                });
            }

            debug!(
                table = %table.name,
                records = table.records.len(),
                "loaded {}",
                path.display()
            );
            sources.insert(table.name.clone(), path);
            tables.push(table);
        }

        Ok(tables)
    }

    /// Load a single file into a table named after the file
    pub async fn load_file(&self, path: &Path) -> Result<Table, LoadError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let raw_records = self
            .parser
            .parse(&bytes)
            .map_err(|source| LoadError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let records = raw_records
            .into_iter()
            .enumerate()
            .map(|(index, raw)| build_record(path, index, raw))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Table::new(table_name(path), records))
    }
}

/// File base name with the extension stripped
pub fn table_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn build_record(path: &Path, index: usize, raw: RawRecord) -> Result<Record, LoadError> {
    let mut values = Vec::with_capacity(raw.len());

    for (key, literal) in raw {
        let column = match key {
            Literal::String(name) => name,
            other => {
                return Err(LoadError::InvalidKey {
                    path: path.to_path_buf(),
                    record: index,
                    key: other.describe(),
                });
            }
        };

        let value = normalize(literal).map_err(|source| LoadError::Normalize {
            path: path.to_path_buf(),
            record: index,
            column: column.clone(),
            source,
        })?;

        values.push((column, value));
    }

    Ok(Record::new(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NormalizeError;
    use crate::model::{Array, Value};
    use tempfile::TempDir;

    fn write(dir: &TempDir, relative: &str, content: &str) -> PathBuf {
        let path = dir.path().join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    fn string(s: &str) -> Value {
        Value::String(s.to_string())
    }

    #[test]
    fn test_table_name_strips_extension() {
        assert_eq!(table_name(Path::new("seeds/AllTypes.yaml")), "AllTypes");
        assert_eq!(table_name(Path::new("a/b/Singers.yml")), "Singers");
        assert_eq!(table_name(Path::new("x.y.yaml")), "x.y");
    }

    #[tokio::test]
    async fn test_load_checked_in_seeds() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata/seeds");
        let tables = Loader::new().load(&root).await.unwrap();

        let names: Vec<_> = tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["AllTypes", "Bar", "Baz", "Boo", "Foo"]);

        let all_types = &tables[0].records;
        assert_eq!(all_types.len(), 1);
        let record = &all_types[0];
        assert_eq!(record.get("ID"), Some(&string("All_Type_Values")));
        assert_eq!(record.get("BoolValue"), Some(&Value::Bool(true)));
        assert_eq!(record.get("Int64Value"), Some(&Value::Int64(42)));
        assert_eq!(record.get("Float64Value"), Some(&Value::Float64(3.5)));
        assert_eq!(record.get("BytesValue"), Some(&string("aG9nZQ==")));
        assert_eq!(record.get("JSONValue"), Some(&string(r#"{"test": 1}"#)));
        assert_eq!(
            record.get("NumericValue"),
            Some(&string("-12345678901234567890123456789.123456789"))
        );
        assert_eq!(record.get("DateValue"), Some(&string("2022-04-01")));
        assert_eq!(
            record.get("TimestampValue"),
            Some(&string("2022-04-01T00:00:00Z"))
        );
        assert_eq!(
            record.get("BoolArray"),
            Some(&Value::Array(Array::Bool(vec![Some(true), Some(false)])))
        );
        assert_eq!(
            record.get("Int64Array"),
            Some(&Value::Array(Array::Int64(vec![Some(12), Some(34)])))
        );
        assert_eq!(
            record.get("Float64Array"),
            Some(&Value::Array(Array::Float64(vec![Some(12.34), Some(56.789)])))
        );
        assert_eq!(
            record.get("StringArray"),
            Some(&Value::Array(Array::String(vec![
                Some("Foo".to_string()),
                Some("Bar".to_string())
            ])))
        );
        let first_columns: Vec<_> = record.columns().take(3).collect();
        assert_eq!(first_columns, vec!["ID", "StringValue", "BoolValue"]);

        let foo = &tables[4];
        assert_eq!(foo.records.len(), 4);
        assert_eq!(foo.records[3].get("FooID"), Some(&Value::Int64(123)));
        assert_eq!(foo.records[3].get("Name"), Some(&string("foo4")));

        let bar = &tables[1];
        assert_eq!(bar.records.len(), 3);
        let bar_columns: Vec<_> = bar.records[0].columns().collect();
        assert_eq!(bar_columns, vec!["FooID", "BarID", "Name"]);
    }

    #[tokio::test]
    async fn test_one_record_per_entry_and_nested_dirs() {
        let temp_dir = TempDir::new().unwrap();
        write(
            &temp_dir,
            "Singers.yaml",
            "- SingerId: 1\n  Name: Marc\n- SingerId: 2\n  Name: Catalina\n",
        );
        write(
            &temp_dir,
            "music/Albums.yml",
            "- SingerId: 1\n  AlbumId: 1\n  Title: Total Junk\n",
        );
        write(&temp_dir, "music/notes.md", "not a seed file");

        let tables = Loader::new().load(temp_dir.path()).await.unwrap();

        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].name, "Singers");
        assert_eq!(tables[0].records.len(), 2);
        assert_eq!(tables[1].name, "Albums");
        assert_eq!(tables[1].records[0].get("Title"), Some(&string("Total Junk")));
    }

    #[tokio::test]
    async fn test_duplicate_table_names_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let first = write(&temp_dir, "a/Foo.yaml", "- FooID: 1\n");
        let second = write(&temp_dir, "b/Foo.yml", "- FooID: 2\n");

        let err = Loader::new().load(temp_dir.path()).await.unwrap_err();

        match err {
            LoadError::DuplicateTable {
                name,
                first: f,
                second: s,
            } => {
                assert_eq!(name, "Foo");
                assert_eq!(f, first);
                assert_eq!(s, second);
            }
            other => panic!("expected duplicate table error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_key_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = write(&temp_dir, "Foo.yaml", "- Name: ok\n- 42: answer\n");

        let err = Loader::new().load(temp_dir.path()).await.unwrap_err();

        match err {
            LoadError::InvalidKey {
                path: p,
                record,
                key,
            } => {
                assert_eq!(p, path);
                assert_eq!(record, 1);
                assert_eq!(key, "42");
            }
            other => panic!("expected invalid key error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_normalization_error_names_column() {
        let temp_dir = TempDir::new().unwrap();
        write(&temp_dir, "Mixed.yaml", "- ID: 1\n  Tags: [a, 1]\n");

        let err = Loader::new().load(temp_dir.path()).await.unwrap_err();

        match err {
            LoadError::Normalize {
                record,
                column,
                source,
                ..
            } => {
                assert_eq!(record, 0);
                assert_eq!(column, "Tags");
                assert!(matches!(source, NormalizeError::UnsupportedListType { .. }));
            }
            other => panic!("expected normalize error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unsigned_out_of_range_rejected() {
        let temp_dir = TempDir::new().unwrap();
        write(&temp_dir, "Big.yaml", "- ID: 18446744073709551615\n");

        let err = Loader::new().load(temp_dir.path()).await.unwrap_err();

        assert!(matches!(
            err,
            LoadError::Normalize {
                source: NormalizeError::ValueRange { .. },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_parse_error_names_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = write(&temp_dir, "Broken.yaml", "- Name: [unclosed\n");

        let err = Loader::new().load(temp_dir.path()).await.unwrap_err();

        match err {
            LoadError::Parse { path: p, .. } => assert_eq!(p, path),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_directory_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");

        let err = Loader::new().load(&missing).await.unwrap_err();

        assert!(matches!(err, LoadError::Io { .. }));
    }
}
