//! Document model for the lazy JSON parser.
//!
//! # Design
//! Objects are ordered `(key, Value)` vectors: insertion order is preserved
//! and duplicate keys are kept side by side. A nested object or array found
//! as a value is not materialized; it is kept as `Value::Raw`, the exact
//! source fragment, and becomes structure only when parsed again.
//!
//! String contents are stored as they appeared between the quotes, escape
//! sequences included. Nothing is decoded, so serializing a string gives back
//! the source text.

/// A single JSON value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    /// Verbatim nested object or array text, including its delimiters.
    Raw(String),
    Number(f64),
    Bool(bool),
    Null,
}

/// Discriminant used by the query engine to filter matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    String,
    Number,
    Boolean,
    Null,
}

impl Value {
    /// `Raw("{}")`, an empty nested object.
    pub fn empty_object() -> Self {
        Value::Raw("{}".to_string())
    }

    /// `Raw("[]")`, an empty nested array.
    pub fn empty_array() -> Self {
        Value::Raw("[]".to_string())
    }

    /// Scalar kind of this value; `None` for raw fragments.
    pub fn kind(&self) -> Option<Kind> {
        match self {
            Value::String(_) => Some(Kind::String),
            Value::Number(_) => Some(Kind::Number),
            Value::Bool(_) => Some(Kind::Boolean),
            Value::Null => Some(Kind::Null),
            Value::Raw(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The unparsed fragment of a nested object or array.
    pub fn as_raw(&self) -> Option<&str> {
        match self {
            Value::Raw(s) => Some(s),
            _ => None,
        }
    }
}

/// Ordered key/value entries of one JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Object {
    entries: Vec<(String, Value)>,
}

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. An existing entry with the same key is left in place.
    pub fn push(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.entries.push((key.into(), value));
        self
    }

    pub fn push_string(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.push(key, Value::String(value.into()))
    }

    pub fn push_number(&mut self, key: impl Into<String>, value: f64) -> &mut Self {
        self.push(key, Value::Number(value))
    }

    pub fn push_bool(&mut self, key: impl Into<String>, value: bool) -> &mut Self {
        self.push(key, Value::Bool(value))
    }

    pub fn push_null(&mut self, key: impl Into<String>) -> &mut Self {
        self.push(key, Value::Null)
    }

    /// First value stored under `key`, at this level only.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One element of a JSON array.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Object(Object),
    Value(Value),
}

/// Ordered elements of one JSON array.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Array {
    elements: Vec<Element>,
}

impl Array {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, element: Element) -> &mut Self {
        self.elements.push(element);
        self
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Element> {
        self.elements.iter()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Root of a parsed document: exactly one object or one array.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Object(Object),
    Array(Array),
}

impl Document {
    pub fn is_array(&self) -> bool {
        matches!(self, Document::Array(_))
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Document::Object(o) => Some(o),
            Document::Array(_) => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Object> {
        match self {
            Document::Object(o) => Some(o),
            Document::Array(_) => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Document::Array(a) => Some(a),
            Document::Object(_) => None,
        }
    }
}

impl From<Object> for Document {
    fn from(object: Object) -> Self {
        Document::Object(object)
    }
}

impl From<Array> for Document {
    fn from(array: Array) -> Self {
        Document::Array(array)
    }
}
