//! One-shot flash messages carried across a redirect in a cookie.

use actix_web::{cookie::Cookie, http::header, HttpRequest, HttpResponse};
use base64::Engine;
use serde::{Deserialize, Serialize};

pub const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Flash { kind: FlashKind::Success, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Flash { kind: FlashKind::Error, message: message.into() }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Flash { kind: FlashKind::Info, message: message.into() }
    }
}

fn encode(flashes: &[Flash]) -> String {
    let json = serde_json::to_vec(flashes).unwrap_or_default();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(json)
}

pub(crate) fn decode(value: &str) -> Vec<Flash> {
    base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(value)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_default()
}

/// Reads the pending messages without consuming them
pub fn peek_flashes(req: &HttpRequest) -> Vec<Flash> {
    req.cookie(FLASH_COOKIE)
        .map(|c| decode(c.value()))
        .unwrap_or_default()
}

fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(FLASH_COOKIE, "").path("/").finish();
    cookie.make_removal();
    cookie
}

/// 302 to `location`, leaving `flashes` for the next rendered page
pub fn redirect(location: &str, flashes: Vec<Flash>) -> HttpResponse {
    let mut builder = HttpResponse::Found();
    builder.insert_header((header::LOCATION, location.to_string()));

    if !flashes.is_empty() {
        builder.cookie(
            Cookie::build(FLASH_COOKIE, encode(&flashes))
                .path("/")
                .http_only(true)
                .finish(),
        );
    }

    builder.finish()
}

/// Renders a page payload, attaching (and consuming) any pending flashes
pub fn page(req: &HttpRequest, mut body: serde_json::Value) -> HttpResponse {
    let flashes = peek_flashes(req);
    let mut builder = HttpResponse::Ok();

    if req.cookie(FLASH_COOKIE).is_some() {
        builder.cookie(removal_cookie());
    }

    if let Some(obj) = body.as_object_mut() {
        obj.insert("success".to_string(), serde_json::Value::Bool(true));
        obj.insert(
            "flashes".to_string(),
            serde_json::to_value(&flashes).unwrap_or_default(),
        );
    }

    builder.json(body)
}
