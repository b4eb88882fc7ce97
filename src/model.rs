//! Tables, records and the normalized value set accepted by the store

/// A table loaded from one data file
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub records: Vec<Record>,
}

impl Table {
    pub fn new(name: impl Into<String>, records: Vec<Record>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }
}

/// A single row, columns kept in source order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: Vec<(String, Value)>,
}

impl Record {
    pub fn new(values: Vec<(String, Value)>) -> Self {
        Self { values }
    }

    /// Look up a column value by name
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Kind of a normalized value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Int64,
    Float64,
    String,
    Bytes,
    Array,
}

impl ValueKind {
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Int64 => "int64",
            ValueKind::Float64 => "float64",
            ValueKind::String => "string",
            ValueKind::Bytes => "bytes",
            ValueKind::Array => "array",
        }
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A value in the restricted type set the store accepts
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int64(i64),
    Float64(f64),
    String(String),
    Bytes(Vec<u8>),
    Array(Array),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int64(_) => ValueKind::Int64,
            Value::Float64(_) => ValueKind::Float64,
            Value::String(_) => ValueKind::String,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::Array(_) => ValueKind::Array,
        }
    }
}

/// Homogeneous array of one scalar kind. Elements may be null.
#[derive(Debug, Clone, PartialEq)]
pub enum Array {
    Bool(Vec<Option<bool>>),
    Int64(Vec<Option<i64>>),
    Float64(Vec<Option<f64>>),
    String(Vec<Option<String>>),
    Bytes(Vec<Option<Vec<u8>>>),
}

impl Array {
    pub fn len(&self) -> usize {
        match self {
            Array::Bool(v) => v.len(),
            Array::Int64(v) => v.len(),
            Array::Float64(v) => v.len(),
            Array::String(v) => v.len(),
            Array::Bytes(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Elements as scalar values, nulls as `Value::Null`
    pub fn elements(&self) -> Vec<Value> {
        fn lift<T: Clone>(items: &[Option<T>], wrap: fn(T) -> Value) -> Vec<Value> {
            items
                .iter()
                .map(|item| item.clone().map(wrap).unwrap_or(Value::Null))
                .collect()
        }

        match self {
            Array::Bool(v) => lift(v, Value::Bool),
            Array::Int64(v) => lift(v, Value::Int64),
            Array::Float64(v) => lift(v, Value::Float64),
            Array::String(v) => lift(v, Value::String),
            Array::Bytes(v) => lift(v, Value::Bytes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_preserves_column_order() {
        let record = Record::new(vec![
            ("Zeta".to_string(), Value::Int64(1)),
            ("Alpha".to_string(), Value::String("a".to_string())),
            ("Mid".to_string(), Value::Null),
        ]);

        let columns: Vec<_> = record.columns().collect();
        assert_eq!(columns, vec!["Zeta", "Alpha", "Mid"]);
        assert_eq!(record.get("Alpha"), Some(&Value::String("a".to_string())));
        assert_eq!(record.get("Missing"), None);
        assert_eq!(record.len(), 3);
    }

    #[test]
    fn test_array_elements() {
        let array = Array::Int64(vec![Some(12), None, Some(34)]);

        assert_eq!(array.len(), 3);
        assert_eq!(
            array.elements(),
            vec![Value::Int64(12), Value::Null, Value::Int64(34)]
        );
    }
}
