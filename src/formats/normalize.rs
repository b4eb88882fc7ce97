//! Normalization of parsed literals into store values
//!
//! The store accepts null, bool, signed 64-bit integers, 64-bit floats,
//! strings, bytes, and homogeneous arrays of those scalars. Unsigned integers
//! are narrowed to signed ones (range-checked); everything else that a data
//! file can express is rejected.

use crate::error::NormalizeError;
use crate::formats::literal::Literal;
use crate::model::{Array, Value, ValueKind};

/// Convert one literal into a store value
pub fn normalize(literal: Literal) -> Result<Value, NormalizeError> {
    match literal {
        Literal::List(items) => normalize_list(items),
        other => normalize_scalar(other),
    }
}

fn normalize_scalar(literal: Literal) -> Result<Value, NormalizeError> {
    match literal {
        Literal::Null => Ok(Value::Null),
        Literal::Bool(b) => Ok(Value::Bool(b)),
        Literal::Int(i) => Ok(Value::Int64(i)),
        Literal::Uint(u) => narrow_unsigned(u).map(Value::Int64),
        Literal::Float(f) => Ok(Value::Float64(f)),
        Literal::String(s) => Ok(Value::String(s)),
        Literal::Bytes(b) => Ok(Value::Bytes(b)),
        other => Err(NormalizeError::UnsupportedValueType {
            kind: other.describe(),
        }),
    }
}

fn narrow_unsigned(value: u64) -> Result<i64, NormalizeError> {
    i64::try_from(value).map_err(|_| NormalizeError::ValueRange { value })
}

fn normalize_list(items: Vec<Literal>) -> Result<Value, NormalizeError> {
    let mut elements = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        if matches!(
            item,
            Literal::List(_) | Literal::Map(_) | Literal::Tagged { .. }
        ) {
            return Err(NormalizeError::UnsupportedListType {
                reason: format!("element {} is a {}", index, item.kind_name()),
            });
        }
        elements.push(normalize_scalar(item)?);
    }

    let kind = elements
        .iter()
        .map(Value::kind)
        .find(|kind| *kind != ValueKind::Null)
        .ok_or_else(|| NormalizeError::UnsupportedListType {
            reason: "element type of an empty or all-null list cannot be inferred".to_string(),
        })?;

    let array = match kind {
        ValueKind::Bool => Array::Bool(gather(elements, kind, |v| match v {
            Value::Bool(b) => Some(b),
            _ => None,
        })?),
        ValueKind::Int64 => Array::Int64(gather(elements, kind, |v| match v {
            Value::Int64(i) => Some(i),
            _ => None,
        })?),
        ValueKind::Float64 => Array::Float64(gather(elements, kind, |v| match v {
            Value::Float64(f) => Some(f),
            _ => None,
        })?),
        ValueKind::String => Array::String(gather(elements, kind, |v| match v {
            Value::String(s) => Some(s),
            _ => None,
        })?),
        ValueKind::Bytes => Array::Bytes(gather(elements, kind, |v| match v {
            Value::Bytes(b) => Some(b),
            _ => None,
        })?),
        ValueKind::Null | ValueKind::Array => {
            return Err(NormalizeError::UnsupportedListType {
                reason: format!("{} elements are not supported", kind),
            });
        }
    };

    Ok(Value::Array(array))
}

/// Collect elements of one kind, keeping nulls in place
fn gather<T>(
    elements: Vec<Value>,
    kind: ValueKind,
    extract: impl Fn(Value) -> Option<T>,
) -> Result<Vec<Option<T>>, NormalizeError> {
    elements
        .into_iter()
        .enumerate()
        .map(|(index, element)| {
            if element == Value::Null {
                return Ok(None);
            }
            let element_kind = element.kind();
            extract(element)
                .map(Some)
                .ok_or_else(|| NormalizeError::UnsupportedListType {
                    reason: format!(
                        "mixed element types: {} and {} (element {})",
                        kind, element_kind, index
                    ),
                })
        })
        .collect()
}

impl From<Value> for Literal {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Literal::Null,
            Value::Bool(b) => Literal::Bool(b),
            Value::Int64(i) => Literal::Int(i),
            Value::Float64(f) => Literal::Float(f),
            Value::String(s) => Literal::String(s),
            Value::Bytes(b) => Literal::Bytes(b),
            Value::Array(array) => {
                Literal::List(array.elements().into_iter().map(Literal::from).collect())
            }
        }
    }
}
