//! Request handlers

use crate::response::outcome_response;
use crate::state::AppState;
use axum::extract::State;
use axum::http::{HeaderMap, Method as HttpMethod, Uri, header};
use axum::response::{IntoResponse, Response};
use quiver_auth::Credentials;
use quiver_maven::{Method, Outcome};
use tracing::debug;

/// GET/HEAD on any artifact path
pub async fn lookup(
    State(state): State<AppState>,
    method: HttpMethod,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let method = if method == HttpMethod::HEAD {
        Method::Head
    } else {
        Method::Get
    };

    let path = match urlencoding::decode(uri.path()) {
        Ok(path) => path.into_owned(),
        Err(e) => {
            debug!("Undecodable request path {}: {}", uri.path(), e);
            return outcome_response(Outcome::SoftError("Invalid request path".to_string()));
        }
    };

    let outcome = state
        .lookup
        .clone()
        .lookup(path, credentials(&headers), method)
        .await;
    outcome_response(outcome)
}

pub async fn health() -> impl IntoResponse {
    "OK"
}

/// Credentials from the `Authorization` header, if present and well formed
fn credentials(headers: &HeaderMap) -> Option<Credentials> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    match Credentials::from_header(value) {
        Ok(credentials) => Some(credentials),
        Err(e) => {
            debug!("Ignoring Authorization header: {}", e);
            None
        }
    }
}
