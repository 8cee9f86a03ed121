//! In-memory DNS-record API used to exercise the client end to end.
//!
//! Routes mirror the shape of a hosted DNS provider: records live under a
//! zone, every response is wrapped in a `{"result","success","errors",
//! "messages"}` envelope and every record route requires a bearer token.
//! `/ip` answers with a fixed public address in plain text, and
//! `/stream/zones/{zone_id}/dns_records` returns the record listing with an
//! unknown length so HTTP/1.1 clients receive it chunked.

use std::{convert::Infallible, sync::Arc};

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use futures_util::stream;
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const DEFAULT_TOKEN: &str = "test-token";
pub const DEFAULT_PUBLIC_IP: &str = "198.51.100.4";

/// Size of each body chunk on the streaming route.
pub const STREAM_CHUNK_SIZE: usize = 16;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DnsRecord {
    pub id: String,
    pub zone_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub content: String,
    pub ttl: u32,
    pub proxied: bool,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub content: String,
    #[serde(default = "default_ttl")]
    pub ttl: u32,
    #[serde(default)]
    pub proxied: bool,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Full replacement of a record; `ttl`, `proxied` and `comment` keep their
/// current values when absent.
#[derive(Deserialize)]
pub struct UpdateRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub content: String,
    pub ttl: Option<u32>,
    pub proxied: Option<bool>,
    pub comment: Option<String>,
}

#[derive(Deserialize)]
pub struct RecordFilter {
    #[serde(rename = "type")]
    pub record_type: Option<String>,
    pub name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiMessage {
    pub code: u32,
    pub message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub result: T,
    pub success: bool,
    pub errors: Vec<ApiMessage>,
    pub messages: Vec<ApiMessage>,
}

impl<T> Envelope<T> {
    fn ok(result: T) -> Json<Self> {
        Json(Self {
            result,
            success: true,
            errors: Vec::new(),
            messages: Vec::new(),
        })
    }
}

#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    RecordNotFound,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::Unauthorized => (StatusCode::FORBIDDEN, 9109, "Invalid access token"),
            ApiError::RecordNotFound => (StatusCode::NOT_FOUND, 81044, "Record does not exist."),
        };
        let body = Envelope::<Option<DnsRecord>> {
            result: None,
            success: false,
            errors: vec![ApiMessage {
                code,
                message: message.to_string(),
            }],
            messages: Vec::new(),
        };
        (status, Json(body)).into_response()
    }
}

/// Values the server answers with.
#[derive(Clone, Debug)]
pub struct Settings {
    pub token: String,
    pub public_ip: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            token: DEFAULT_TOKEN.to_string(),
            public_ip: DEFAULT_PUBLIC_IP.to_string(),
        }
    }
}

impl Settings {
    /// Defaults overridden by `DDNS_MOCK_TOKEN` and `DDNS_MOCK_IP`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            token: std::env::var("DDNS_MOCK_TOKEN").unwrap_or(defaults.token),
            public_ip: std::env::var("DDNS_MOCK_IP").unwrap_or(defaults.public_ip),
        }
    }
}

pub struct AppState {
    settings: Settings,
    records: RwLock<Vec<DnsRecord>>,
}

pub type Db = Arc<AppState>;

pub fn app() -> Router {
    router(Settings::default())
}

pub fn router(settings: Settings) -> Router {
    let db: Db = Arc::new(AppState {
        settings,
        records: RwLock::new(Vec::new()),
    });
    Router::new()
        .route("/ip", get(public_ip))
        .route(
            "/client/v4/zones/{zone_id}/dns_records",
            get(list_records).post(create_record),
        )
        .route(
            "/client/v4/zones/{zone_id}/dns_records/{id}",
            put(update_record),
        )
        .route("/stream/zones/{zone_id}/dns_records", get(stream_records))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, Settings::default()).await
}

pub async fn run_with(listener: TcpListener, settings: Settings) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock DNS API listening");
    }
    axum::serve(listener, router(settings)).await
}

fn default_ttl() -> u32 {
    1
}

fn authorize(db: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    if presented == Some(db.settings.token.as_str()) {
        Ok(())
    } else {
        debug!("rejected request with missing or wrong token");
        Err(ApiError::Unauthorized)
    }
}

async fn matching_records(db: &AppState, zone_id: &str, filter: &RecordFilter) -> Vec<DnsRecord> {
    db.records
        .read()
        .await
        .iter()
        .filter(|r| r.zone_id == zone_id)
        .filter(|r| filter.record_type.as_ref().map_or(true, |t| &r.record_type == t))
        .filter(|r| filter.name.as_ref().map_or(true, |n| &r.name == n))
        .cloned()
        .collect()
}

async fn public_ip(State(db): State<Db>) -> String {
    db.settings.public_ip.clone()
}

async fn list_records(
    State(db): State<Db>,
    Path(zone_id): Path<String>,
    Query(filter): Query<RecordFilter>,
    headers: HeaderMap,
) -> Result<Json<Envelope<Vec<DnsRecord>>>, ApiError> {
    authorize(&db, &headers)?;
    Ok(Envelope::ok(matching_records(&db, &zone_id, &filter).await))
}

async fn create_record(
    State(db): State<Db>,
    Path(zone_id): Path<String>,
    headers: HeaderMap,
    Json(input): Json<CreateRecord>,
) -> Result<Json<Envelope<DnsRecord>>, ApiError> {
    authorize(&db, &headers)?;
    let record = DnsRecord {
        id: Uuid::new_v4().simple().to_string(),
        zone_id,
        name: input.name,
        record_type: input.record_type,
        content: input.content,
        ttl: input.ttl,
        proxied: input.proxied,
        comment: input.comment,
    };
    debug!(id = %record.id, name = %record.name, "record created");
    db.records.write().await.push(record.clone());
    Ok(Envelope::ok(record))
}

async fn update_record(
    State(db): State<Db>,
    Path((zone_id, id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(input): Json<UpdateRecord>,
) -> Result<Json<Envelope<DnsRecord>>, ApiError> {
    authorize(&db, &headers)?;
    let mut records = db.records.write().await;
    let record = records
        .iter_mut()
        .find(|r| r.zone_id == zone_id && r.id == id)
        .ok_or(ApiError::RecordNotFound)?;

    record.name = input.name;
    record.record_type = input.record_type;
    record.content = input.content;
    if let Some(ttl) = input.ttl {
        record.ttl = ttl;
    }
    if let Some(proxied) = input.proxied {
        record.proxied = proxied;
    }
    if input.comment.is_some() {
        record.comment = input.comment;
    }
    debug!(%id, content = %record.content, "record updated");
    Ok(Envelope::ok(record.clone()))
}

async fn stream_records(
    State(db): State<Db>,
    Path(zone_id): Path<String>,
    Query(filter): Query<RecordFilter>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    authorize(&db, &headers)?;
    let records = matching_records(&db, &zone_id, &filter).await;
    let Json(envelope) = Envelope::ok(records);
    let text = serde_json::to_vec(&envelope).unwrap_or_default();

    let chunks: Vec<Result<Vec<u8>, Infallible>> = text
        .chunks(STREAM_CHUNK_SIZE)
        .map(|chunk| Ok(chunk.to_vec()))
        .collect();
    let body = Body::from_stream(stream::iter(chunks));
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> DnsRecord {
        DnsRecord {
            id: Uuid::nil().simple().to_string(),
            zone_id: "zone".to_string(),
            name: "home.example.com".to_string(),
            record_type: "A".to_string(),
            content: "203.0.113.7".to_string(),
            ttl: 3600,
            proxied: true,
            comment: None,
        }
    }

    #[test]
    fn record_serializes_type_field() {
        let json = serde_json::to_value(record()).unwrap();
        assert_eq!(json["id"], "00000000000000000000000000000000");
        assert_eq!(json["type"], "A");
        assert_eq!(json["ttl"], 3600);
        assert!(json["comment"].is_null());
    }

    #[test]
    fn envelope_wraps_result() {
        let Json(envelope) = Envelope::ok(vec![record()]);
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["result"][0]["content"], "203.0.113.7");
        assert_eq!(json["errors"], serde_json::json!([]));
    }

    #[test]
    fn create_record_defaults() {
        let input: CreateRecord =
            serde_json::from_str(r#"{"name":"a.example.com","type":"A","content":"1.2.3.4"}"#)
                .unwrap();
        assert_eq!(input.ttl, 1);
        assert!(!input.proxied);
        assert!(input.comment.is_none());
    }

    #[test]
    fn update_record_requires_content() {
        let result: Result<UpdateRecord, _> =
            serde_json::from_str(r#"{"name":"a.example.com","type":"A"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn update_record_accepts_client_body() {
        let input: UpdateRecord = serde_json::from_str(
            r#"{"name":"home.example.com","ttl":3600,"type":"A","comment":"ddns","content":"198.51.100.4","proxied":true}"#,
        )
        .unwrap();
        assert_eq!(input.ttl, Some(3600));
        assert_eq!(input.proxied, Some(true));
        assert_eq!(input.comment.as_deref(), Some("ddns"));
    }

    #[test]
    fn filter_fields_are_optional() {
        let filter: RecordFilter = serde_json::from_str("{}").unwrap();
        assert!(filter.record_type.is_none());
        assert!(filter.name.is_none());
    }
}
