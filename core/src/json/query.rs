//! Key search across every nesting level of a document.
//!
//! # Design
//! Nested containers are stored as `Value::Raw` text, so the search parses
//! each fragment it meets and continues inside the result. Matches are
//! collected depth-first in document order: an entry's own match comes
//! before anything found inside its value. Fragments that do not parse as
//! a document are skipped.
//!
//! String searches also match nested containers: a key whose value is an
//! object or array yields the fragment text, the way a plain string would.

use tracing::trace;

use super::parser::Parser;
use super::value::{Document, Element, Kind, Object, Value};

/// Nesting levels searched below the root.
pub const MAX_DEPTH: usize = 128;

/// Every value of `kind` stored under `key`, at any depth.
///
/// Bare values inside arrays are matched as if stored under the empty key.
/// With `Kind::String`, `Value::Raw` fragments match as well.
pub fn get_values(document: &Document, key: &str, kind: Kind) -> Vec<Value> {
    let mut found = Vec::new();
    Search { key, kind, found: &mut found }.document(document, 0);
    found
}

pub fn get_string_values(document: &Document, key: &str) -> Vec<String> {
    get_values(document, key, Kind::String)
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) | Value::Raw(s) => Some(s),
            _ => None,
        })
        .collect()
}

pub fn get_number_values(document: &Document, key: &str) -> Vec<f64> {
    get_values(document, key, Kind::Number)
        .iter()
        .filter_map(Value::as_f64)
        .collect()
}

pub fn get_boolean_values(document: &Document, key: &str) -> Vec<bool> {
    get_values(document, key, Kind::Boolean)
        .iter()
        .filter_map(Value::as_bool)
        .collect()
}

/// One `true` per `null` stored under `key`.
pub fn get_null_values(document: &Document, key: &str) -> Vec<bool> {
    get_values(document, key, Kind::Null)
        .iter()
        .map(Value::is_null)
        .collect()
}

struct Search<'a> {
    key: &'a str,
    kind: Kind,
    found: &'a mut Vec<Value>,
}

impl Search<'_> {
    fn document(&mut self, document: &Document, depth: usize) {
        match document {
            Document::Object(object) => self.object(object, depth),
            Document::Array(array) => {
                for element in array.iter() {
                    match element {
                        Element::Object(object) => self.object(object, depth),
                        Element::Value(value) => self.entry("", value, depth),
                    }
                }
            }
        }
    }

    fn object(&mut self, object: &Object, depth: usize) {
        for (key, value) in object.iter() {
            self.entry(key, value, depth);
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match value.kind() {
            Some(kind) => kind == self.kind,
            None => self.kind == Kind::String,
        }
    }

    fn entry(&mut self, key: &str, value: &Value, depth: usize) {
        if key == self.key && self.matches(value) {
            self.found.push(value.clone());
        }

        let Value::Raw(text) = value else { return };
        if depth >= MAX_DEPTH {
            trace!(depth, "nesting limit reached, fragment skipped");
            return;
        }
        if let Some(nested) = Parser::new(text).parse() {
            self.document(&nested, depth + 1);
        }
    }
}
