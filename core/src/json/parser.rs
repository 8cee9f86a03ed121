//! Single-pass recursive-descent parser with lazy nesting.
//!
//! # Design
//! The parser walks a byte cursor over the input once. Scalars become
//! `Value`s directly. A nested object or array in value position is skimmed
//! with a depth counter (skipping string contents) and stored as
//! `Value::Raw` without being parsed. Objects inside a top-level array are
//! the exception: they are parsed, one level deep, like a top-level object.
//!
//! Malformed input is not an error. Parsing stops where the input stops
//! making sense and everything accumulated up to that point is returned;
//! `Parser::is_complete` tells the two cases apart.

use super::value::{Array, Document, Element, Object, Value};

pub struct Parser<'a> {
    text: &'a str,
    pos: usize,
    complete: bool,
}

impl<'a> Parser<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            complete: true,
        }
    }

    /// Parse the root value. `None` when the input does not start (after
    /// whitespace) with `{` or `[`.
    pub fn parse(&mut self) -> Option<Document> {
        self.skip_whitespace();
        match self.peek() {
            Some(b'{') => Some(Document::Object(self.object())),
            Some(b'[') => Some(Document::Array(self.array())),
            _ => {
                self.complete = false;
                None
            }
        }
    }

    /// `false` once parsing stopped early on malformed input.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Byte offset where parsing stopped.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn object(&mut self) -> Object {
        let mut object = Object::new();
        self.pos += 1;
        self.skip_whitespace();

        while let Some(b) = self.peek() {
            if b == b'}' {
                break;
            }
            self.skip_whitespace();

            let Some(key) = self.string() else {
                self.stop();
                break;
            };
            self.skip_whitespace();
            if !self.eat(b':') {
                self.stop();
                break;
            }
            self.skip_whitespace();
            let Some(value) = self.value() else {
                self.stop();
                break;
            };
            object.push(key, value);

            self.skip_whitespace();
            // Commas are optional between entries, and a trailing one is allowed.
            self.eat(b',');
            self.skip_whitespace();
        }

        if !self.eat(b'}') {
            self.stop();
        }
        object
    }

    fn array(&mut self) -> Array {
        let mut array = Array::new();
        self.pos += 1;
        self.skip_whitespace();

        while let Some(b) = self.peek() {
            if b == b']' {
                break;
            }
            self.skip_whitespace();

            let element = if self.peek() == Some(b'{') {
                Element::Object(self.object())
            } else {
                match self.value() {
                    Some(value) => Element::Value(value),
                    None => {
                        self.stop();
                        break;
                    }
                }
            };
            array.push(element);
            if !self.complete {
                break;
            }

            self.skip_whitespace();
            self.eat(b',');
            self.skip_whitespace();
        }

        if !self.eat(b']') {
            self.stop();
        }
        array
    }

    fn value(&mut self) -> Option<Value> {
        match self.peek()? {
            b'"' => self.string().map(Value::String),
            b'{' | b'[' => Some(Value::Raw(self.fragment())),
            b'-' | b'0'..=b'9' => Some(Value::Number(self.number())),
            b't' => self.literal("true", Value::Bool(true)),
            b'f' => self.literal("false", Value::Bool(false)),
            b'n' => self.literal("null", Value::Null),
            _ => None,
        }
    }

    /// Text between a pair of quotes, escapes left as written. The cursor
    /// does not move when the string is unterminated.
    fn string(&mut self) -> Option<String> {
        if self.peek() != Some(b'"') {
            return None;
        }
        let end = skip_string(self.bytes(), self.pos)?;
        let content = self.text[self.pos + 1..end - 1].to_string();
        self.pos = end;
        Some(content)
    }

    /// Exact source text of the object or array starting at the cursor.
    fn fragment(&mut self) -> String {
        let bytes = self.bytes();
        let start = self.pos;
        let mut depth = 0usize;
        let mut i = start;

        while i < bytes.len() {
            match bytes[i] {
                b'"' => match skip_string(bytes, i) {
                    Some(end) => {
                        i = end;
                        continue;
                    }
                    None => {
                        i = bytes.len();
                        break;
                    }
                },
                b'{' | b'[' => depth += 1,
                b'}' | b']' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        i += 1;
                        break;
                    }
                }
                _ => {}
            }
            i += 1;
        }

        if depth > 0 && i >= bytes.len() {
            self.stop();
        }
        self.pos = i.min(bytes.len());
        self.text[start..self.pos].to_string()
    }

    fn number(&mut self) -> f64 {
        let start = self.pos;
        self.eat(b'-');
        self.skip_digits();
        if self.eat(b'.') {
            self.skip_digits();
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            self.skip_digits();
        }
        parse_float_prefix(&self.text[start..self.pos])
    }

    fn literal(&mut self, word: &str, value: Value) -> Option<Value> {
        if self.text[self.pos..].starts_with(word) {
            self.pos += word.len();
            Some(value)
        } else {
            None
        }
    }

    fn skip_digits(&mut self) {
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r' | b'\x0b' | b'\x0c')) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes().get(self.pos).copied()
    }

    fn bytes(&self) -> &'a [u8] {
        self.text.as_bytes()
    }

    fn stop(&mut self) {
        self.complete = false;
    }
}

/// Offset just past the closing quote of the string opening at `open`.
fn skip_string(bytes: &[u8], open: usize) -> Option<usize> {
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => return Some(i + 1),
            b'\\' if i + 1 < bytes.len() => i += 2,
            _ => i += 1,
        }
    }
    None
}

/// Longest numeric prefix of `token`, the way `strtod` reads it; `0.0` when
/// there is none.
fn parse_float_prefix(token: &str) -> f64 {
    (1..=token.len())
        .rev()
        .find_map(|end| token[..end].parse::<f64>().ok())
        .unwrap_or(0.0)
}
