//! Structured data parsing and value normalization

pub mod literal;
pub mod normalize;
pub mod reader;
pub mod yaml;

pub use literal::Literal;
pub use normalize::normalize;
pub use reader::{RawRecord, StructuredDocumentParser};
pub use yaml::YamlParser;
