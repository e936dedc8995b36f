//! Outcome to HTTP response mapping

use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use quiver_maven::outcome::OCTET_STREAM;
use quiver_maven::{Outcome, Served};

/// Realm announced on 401 responses
pub const REALM: &str = "Basic realm=\"quiver\"";

pub fn outcome_response(outcome: Outcome) -> Response {
    match outcome {
        Outcome::Served(served) => served_response(served),
        Outcome::SoftError(message) => text(StatusCode::OK, message),
        // Only reachable when nothing handled the local miss
        Outcome::TryProxy(reason) | Outcome::NotFound(reason) => text(StatusCode::NOT_FOUND, reason),
        Outcome::Unauthorized(message) => {
            let mut response = text(StatusCode::UNAUTHORIZED, message);
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(REALM));
            response
        }
        Outcome::InternalError(message) => text(StatusCode::INTERNAL_SERVER_ERROR, message),
    }
}

fn served_response(served: Served) -> Response {
    let status = StatusCode::from_u16(served.status).unwrap_or(StatusCode::OK);

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&served.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static(OCTET_STREAM)),
    );
    if let Some(len) = served.content_length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    }
    if let Some(value) = served
        .file_name
        .and_then(|name| HeaderValue::from_str(&format!("attachment; filename=\"{name}\"")).ok())
    {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    let body = served.body.map_or_else(Body::empty, Body::from);
    (status, headers, body).into_response()
}

fn text(status: StatusCode, message: String) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        message,
    )
        .into_response()
}
