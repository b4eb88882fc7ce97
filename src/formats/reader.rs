use crate::error::ParseError;

use super::literal::Literal;

/// One record as parsed: `(key, literal)` pairs in source order
///
/// Keys are literals too so that the loader can reject non-string keys with
/// a precise error instead of the parser silently stringifying them.
pub type RawRecord = Vec<(Literal, Literal)>;

/// Trait for turning the bytes of one data file into ordered records
pub trait StructuredDocumentParser: Send + Sync {
    /// File extensions (without the dot) this parser handles
    fn extensions(&self) -> &[&str];

    /// Parse a whole file. Record order and key order must be preserved.
    fn parse(&self, bytes: &[u8]) -> Result<Vec<RawRecord>, ParseError>;
}
