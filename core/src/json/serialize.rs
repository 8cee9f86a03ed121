//! Compact text rendering of a document.
//!
//! Output has no whitespace. Strings are written between quotes exactly as
//! stored, raw fragments are copied verbatim, and numbers are rounded to
//! whole values, so `1.5` is written as `2`.

use std::fmt::{self, Display, Formatter, Write};

use super::value::{Array, Document, Element, Object, Value};

pub fn to_string(document: &Document) -> String {
    document.to_string()
}

impl Display for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Document::Object(object) => Display::fmt(object, f),
            Document::Array(array) => Display::fmt(array, f),
        }
    }
}

impl Display for Object {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_char('{')?;
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_char(',')?;
            }
            write!(f, "\"{key}\":{value}")?;
        }
        f.write_char('}')
    }
}

impl Display for Array {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_char('[')?;
        for (i, element) in self.iter().enumerate() {
            if i > 0 {
                f.write_char(',')?;
            }
            match element {
                Element::Object(object) => Display::fmt(object, f)?,
                Element::Value(value) => Display::fmt(value, f)?,
            }
        }
        f.write_char(']')
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "\"{s}\""),
            Value::Raw(text) => f.write_str(text),
            Value::Number(n) => write!(f, "{n:.0}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Null => f.write_str("null"),
        }
    }
}
