//! Lazy JSON documents.
//!
//! `parse` reads one level of structure and keeps nested containers as raw
//! text; the `get_*_values` functions search all levels by re-parsing those
//! fragments on demand; `to_string` renders a document back to compact text.

mod parser;
mod query;
mod serialize;
mod value;

use tracing::debug;

pub use parser::Parser;
pub use query::{
    get_boolean_values, get_null_values, get_number_values, get_string_values, get_values,
    MAX_DEPTH,
};
pub use serialize::to_string;
pub use value::{Array, Document, Element, Kind, Object, Value};

/// Parse `text` leniently.
///
/// Returns `None` when the text is not an object or array. Malformed input
/// further in yields the entries read before the fault.
pub fn parse(text: &str) -> Option<Document> {
    let mut parser = Parser::new(text);
    let document = parser.parse();
    if !parser.is_complete() {
        debug!(
            offset = parser.position(),
            len = text.len(),
            "JSON input ended early or is malformed"
        );
    }
    document
}
