use axum::extract::FromRequestParts;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, request::Parts};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::presentation::http::error::AppError;

/// Structured request body for mounts registered after the body parser.
///
/// JSON bodies must be an object or an array. URL-encoded forms become an
/// object whose bracketed keys nest into objects and arrays. Any other
/// content type, or an empty body, yields `{}`. Mounts registered before
/// the parser never carry this extension and see only the raw bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedBody(pub Value);

#[derive(Debug, thiserror::Error)]
pub enum BodyError {
    #[error("malformed body: {0}")]
    Malformed(String),
}

impl ParsedBody {
    pub fn empty() -> Self {
        ParsedBody(Value::Object(Map::new()))
    }

    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        serde_json::from_value(self.0.clone()).map_err(|e| AppError::bad_request(e.to_string()))
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for ParsedBody
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<ParsedBody>().cloned().ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "parsed body requested on a raw-body mount ({})",
                parts.uri.path()
            ))
        })
    }
}

const FORM_MAX_DEPTH: usize = 5;

fn media_type(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    let essence = raw.split(';').next().unwrap_or_default().trim();
    Some(essence.to_ascii_lowercase())
}

fn is_json(media: &str) -> bool {
    media == "application/json" || (media.starts_with("application/") && media.ends_with("+json"))
}

pub fn parse(headers: &HeaderMap, bytes: &[u8]) -> Result<ParsedBody, BodyError> {
    if bytes.is_empty() {
        return Ok(ParsedBody::empty());
    }
    match media_type(headers) {
        Some(media) if is_json(&media) => parse_json(bytes),
        Some(media) if media == "application/x-www-form-urlencoded" => parse_form(bytes),
        _ => Ok(ParsedBody::empty()),
    }
}

fn parse_json(bytes: &[u8]) -> Result<ParsedBody, BodyError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| BodyError::Malformed(e.to_string()))?;
    match value {
        Value::Object(_) | Value::Array(_) => Ok(ParsedBody(value)),
        _ => Err(BodyError::Malformed(
            "JSON body must be an object or an array".into(),
        )),
    }
}

/// Bracketed keys nest (`item[sku]=whey` becomes `{"item":{"sku":"whey"}}`)
/// and `tag[]=a&tag[]=b` becomes an array. Leaf values stay strings.
fn parse_form(bytes: &[u8]) -> Result<ParsedBody, BodyError> {
    let value: Value = serde_qs::Config::new(FORM_MAX_DEPTH, false)
        .deserialize_bytes(bytes)
        .map_err(|e| BodyError::Malformed(e.to_string()))?;
    Ok(ParsedBody(value))
}
