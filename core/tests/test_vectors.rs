//! Check the response reader, URL parser and JSON layer against the vectors
//! stored in `test-vectors/`.
//!
//! Each vector file lists inputs and expected results. Response vectors are
//! fed through `parse_response` directly and through a real socket, so the
//! read loop and the parser are both covered.

use std::io::Write;
use std::net::TcpListener;

use ddns_core::json::{self, Kind, Value};
use ddns_core::response::{parse_response, read_response};
use ddns_core::{Error, ParsedUrl, Response};

fn load(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap()
}

/// Parse the kind string from test vectors into `Kind`.
fn parse_kind(s: &str) -> Kind {
    match s {
        "string" => Kind::String,
        "number" => Kind::Number,
        "boolean" => Kind::Boolean,
        "null" => Kind::Null,
        other => panic!("unknown kind: {other}"),
    }
}

fn assert_response(name: &str, case: &serde_json::Value, response: &Response) {
    assert_eq!(
        u64::from(response.status),
        case["status"].as_u64().unwrap(),
        "{name}: status"
    );
    assert_eq!(response.text(), case["body"].as_str().unwrap(), "{name}: body");

    if let Some(expected) = case["headers"].as_array() {
        let expected: Vec<(&str, &str)> = expected
            .iter()
            .map(|h| (h[0].as_str().unwrap(), h[1].as_str().unwrap()))
            .collect();
        let actual: Vec<(&str, &str)> = response.headers.iter().collect();
        assert_eq!(actual, expected, "{name}: headers");
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[test]
fn response_vectors_parse() {
    let vectors = load(include_str!("../../test-vectors/responses.json"));
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let raw = case["raw"].as_str().unwrap();
        assert_response(name, case, &parse_response(raw.as_bytes()));
    }
}

#[test]
fn response_vectors_over_a_socket() {
    let vectors = load(include_str!("../../test-vectors/responses.json"));
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let raw = case["raw"].as_str().unwrap().to_string();

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = std::thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            // Dribble the bytes out so reads split at arbitrary points.
            for piece in raw.as_bytes().chunks(7) {
                socket.write_all(piece).unwrap();
                socket.flush().unwrap();
            }
        });

        let mut stream = std::net::TcpStream::connect(addr).unwrap();
        let response = read_response(&mut stream, 5).unwrap();
        server.join().unwrap();
        assert_response(name, case, &response);
    }
}

// ---------------------------------------------------------------------------
// URLs
// ---------------------------------------------------------------------------

#[test]
fn url_vectors() {
    let vectors = load(include_str!("../../test-vectors/urls.json"));
    for case in vectors["cases"].as_array().unwrap() {
        let url = case["url"].as_str().unwrap();
        let expected = &case["expected"];

        match ParsedUrl::parse(url) {
            Ok(parsed) => {
                assert!(!expected.is_null(), "{url}: expected rejection, got {parsed:?}");
                assert_eq!(parsed.scheme.is_tls(), expected["tls"].as_bool().unwrap(), "{url}: tls");
                assert_eq!(parsed.host, expected["host"].as_str().unwrap(), "{url}: host");
                assert_eq!(u64::from(parsed.port), expected["port"].as_u64().unwrap(), "{url}: port");
                assert_eq!(parsed.path, expected["path"].as_str().unwrap(), "{url}: path");
            }
            Err(err) => {
                assert!(expected.is_null(), "{url}: unexpected error {err}");
                assert!(matches!(err, Error::MalformedUrl(_)), "{url}: {err:?}");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

#[test]
fn json_document_vectors() {
    let vectors = load(include_str!("../../test-vectors/json_documents.json"));
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let doc = json::parse(case["text"].as_str().unwrap())
            .unwrap_or_else(|| panic!("{name}: no document"));

        for query in case["queries"].as_array().unwrap() {
            let key = query["key"].as_str().unwrap();
            let kind = parse_kind(query["kind"].as_str().unwrap());
            let expected = query["expected"].as_array().unwrap();

            let found = json::get_values(&doc, key, kind);
            assert_eq!(found.len(), expected.len(), "{name}: {key} count");
            for (value, want) in found.iter().zip(expected) {
                match value {
                    Value::String(s) | Value::Raw(s) => {
                        assert_eq!(s, want.as_str().unwrap(), "{name}: {key}")
                    }
                    Value::Number(n) => assert_eq!(*n, want.as_f64().unwrap(), "{name}: {key}"),
                    Value::Bool(b) => assert_eq!(*b, want.as_bool().unwrap(), "{name}: {key}"),
                    Value::Null => assert_eq!(want, &serde_json::Value::Bool(true), "{name}: {key}"),
                }
            }
        }

        if let Some(serialized) = case["serialized"].as_str() {
            assert_eq!(json::to_string(&doc), serialized, "{name}: serialized");
        }
    }
}

