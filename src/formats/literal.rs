//! Loosely-typed literals as they come out of a structured data file

use serde_yaml::Value as YamlValue;

/// A parsed literal before normalization
///
/// Closed over everything a YAML document can produce. Unsigned integers are
/// kept apart from signed ones because the store only accepts signed 64-bit
/// integers.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    List(Vec<Literal>),
    Map(Vec<(Literal, Literal)>),
    /// A tagged value the parser does not understand, e.g. `!custom foo`
    Tagged { tag: String, value: Box<Literal> },
}

impl Literal {
    /// Human-readable kind for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Literal::Null => "null",
            Literal::Bool(_) => "bool",
            Literal::Int(_) => "signed integer",
            Literal::Uint(_) => "unsigned integer",
            Literal::Float(_) => "float",
            Literal::String(_) => "string",
            Literal::Bytes(_) => "bytes",
            Literal::List(_) => "list",
            Literal::Map(_) => "map",
            Literal::Tagged { .. } => "tagged value",
        }
    }

    /// Short rendering of a literal for diagnostics
    pub fn describe(&self) -> String {
        match self {
            Literal::Null => "null".to_string(),
            Literal::Bool(b) => b.to_string(),
            Literal::Int(i) => i.to_string(),
            Literal::Uint(u) => u.to_string(),
            Literal::Float(f) => f.to_string(),
            Literal::String(s) => format!("{:?}", s),
            Literal::Tagged { tag, .. } => format!("{} value", tag),
            other => format!("<{}>", other.kind_name()),
        }
    }
}

// serde_yaml resolves the core `!!binary` tag to a plain string before it
// reaches us, so only the local `!binary` tag is recognized
const BINARY_TAG: &str = "binary";

impl From<YamlValue> for Literal {
    fn from(value: YamlValue) -> Self {
        match value {
            YamlValue::Null => Literal::Null,
            YamlValue::Bool(b) => Literal::Bool(b),
            YamlValue::Number(n) => {
                if let Some(u) = n.as_u64() {
                    Literal::Uint(u)
                } else if let Some(i) = n.as_i64() {
                    Literal::Int(i)
                } else {
                    // Every YAML number is representable as one of the three
                    Literal::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            YamlValue::String(s) => Literal::String(s),
            YamlValue::Sequence(items) => {
                Literal::List(items.into_iter().map(Literal::from).collect())
            }
            YamlValue::Mapping(mapping) => Literal::Map(
                mapping
                    .into_iter()
                    .map(|(k, v)| (Literal::from(k), Literal::from(v)))
                    .collect(),
            ),
            YamlValue::Tagged(tagged) => {
                let tag = tagged.tag.to_string();
                let inner = Literal::from(tagged.value);
                if tag.trim_start_matches('!') == BINARY_TAG {
                    if let Literal::String(encoded) = &inner {
                        if let Some(bytes) = decode_base64(encoded) {
                            return Literal::Bytes(bytes);
                        }
                    }
                }
                Literal::Tagged {
                    tag,
                    value: Box::new(inner),
                }
            }
        }
    }
}

/// Decode base64 text, ignoring the line breaks YAML block scalars leave behind
pub(crate) fn decode_base64(encoded: &str) -> Option<Vec<u8>> {
    use base64::Engine;

    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(compact)
        .ok()
}
