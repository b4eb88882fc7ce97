//! YAML seed files
//!
//! A seed file is a sequence of mappings, one mapping per record:
//!
//! ```yaml
//! - FooID: e70946a8-2fb8-4457-96b1-d64c0d8d124c
//!   Name: foo1
//! - FooID: 0b64da62-5895-4a7d-97bd-928ac8aaa076
//!   Name: foo2
//! ```

use serde_yaml::Value as YamlValue;

use super::literal::Literal;
use super::reader::{RawRecord, StructuredDocumentParser};
use crate::error::ParseError;

#[derive(Debug, Clone, Copy, Default)]
pub struct YamlParser;

impl YamlParser {
    pub fn new() -> Self {
        Self
    }
}

impl StructuredDocumentParser for YamlParser {
    fn extensions(&self) -> &[&str] {
        &["yaml", "yml"]
    }

    fn parse(&self, bytes: &[u8]) -> Result<Vec<RawRecord>, ParseError> {
        let document: YamlValue = serde_yaml::from_slice(bytes).map_err(|e| ParseError {
            message: e.to_string(),
            line: e.location().map(|l| l.line()),
        })?;

        let items = match document {
            // Empty file
            YamlValue::Null => return Ok(Vec::new()),
            YamlValue::Sequence(items) => items,
            other => {
                return Err(ParseError::new(format!(
                    "expected a list of records at the top level, found {}",
                    Literal::from(other).kind_name()
                )));
            }
        };

        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                YamlValue::Mapping(mapping) => Ok(mapping
                    .into_iter()
                    .map(|(key, value)| (Literal::from(key), Literal::from(value)))
                    .collect()),
                other => Err(ParseError::new(format!(
                    "record {} is a {}, expected a mapping",
                    index,
                    Literal::from(other).kind_name()
                ))),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> Literal {
        Literal::String(name.to_string())
    }

    #[test]
    fn test_parse_records_in_order() {
        let yaml = b"\
- FooID: e70946a8-2fb8-4457-96b1-d64c0d8d124c
  Name: foo1
- Name: foo4
  FooID: 123
";
        let records = YamlParser::new().parse(yaml).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0],
            vec![
                (
                    key("FooID"),
                    Literal::String("e70946a8-2fb8-4457-96b1-d64c0d8d124c".to_string())
                ),
                (key("Name"), Literal::String("foo1".to_string())),
            ]
        );
        assert_eq!(
            records[1],
            vec![
                (key("Name"), Literal::String("foo4".to_string())),
                (key("FooID"), Literal::Uint(123)),
            ]
        );
    }

    #[test]
    fn test_empty_document_has_no_records() {
        assert!(YamlParser::new().parse(b"").unwrap().is_empty());
        assert!(YamlParser::new().parse(b"[]").unwrap().is_empty());
    }

    #[test]
    fn test_non_string_keys_are_kept_as_literals() {
        let records = YamlParser::new().parse(b"- 1: one\n").unwrap();
        assert_eq!(
            records[0],
            vec![(Literal::Uint(1), Literal::String("one".to_string()))]
        );
    }

    #[test]
    fn test_top_level_mapping_rejected() {
        let err = YamlParser::new().parse(b"Name: foo\n").unwrap_err();
        assert!(err.message.contains("top level"), "{}", err.message);
    }

    #[test]
    fn test_scalar_record_rejected() {
        let err = YamlParser::new().parse(b"- Name: foo\n- bare\n").unwrap_err();
        assert!(err.message.contains("record 1"), "{}", err.message);
    }

    #[test]
    fn test_malformed_yaml_reports_line() {
        let err = YamlParser::new()
            .parse(b"- Name: foo\n- Name: [unclosed\n")
            .unwrap_err();
        assert!(err.line.is_some());
    }
}
