//! Manifest route.
//!
//! `GET /hls/manifest.m3u8?stream=<url>&start=<secs>&end=<secs>` answers with
//! a playlist or a `302` to the original stream. The only error response is a
//! `400` for a missing stream, or one that cannot be carried in a header.

use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use introskip_core::{Error, ManifestResult};
use serde::Deserialize;

use super::AppContext;

/// Query parameters of the manifest route. All optional so a malformed query
/// is answered by the handler instead of the extractor.
#[derive(Debug, Default, Deserialize)]
pub struct ManifestQuery {
    pub stream: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

pub fn manifest_routes() -> Router<AppContext> {
    Router::new()
        .route("/hls/manifest.m3u8", get(media_playlist))
        .route("/ping", get(ping))
}

/// Serve a skip/splice playlist for `stream`, or redirect to it.
pub async fn media_playlist(
    State(ctx): State<AppContext>,
    Query(query): Query<ManifestQuery>,
) -> Response {
    let Some(stream) = query.stream.filter(|s| !s.trim().is_empty()) else {
        return validation_error("Missing stream URL");
    };
    // The stream ends up in a Location header or a playlist line.
    if stream.chars().any(char::is_control) {
        return validation_error("Invalid stream URL");
    }

    let start = parse_marker(query.start.as_deref());
    let end = parse_marker(query.end.as_deref());

    match ctx.proxy.resolve(&stream, start, end).await {
        ManifestResult::Manifest { content_type, body } => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, content_type),
                (header::CACHE_CONTROL, "no-cache"),
            ],
            body,
        )
            .into_response(),
        ManifestResult::Fallback { redirect_to } => {
            match HeaderValue::from_bytes(redirect_to.as_bytes()) {
                Ok(location) => {
                    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
                }
                Err(_) => validation_error("Invalid stream URL"),
            }
        }
    }
}

fn validation_error(message: &str) -> Response {
    let err = Error::Validation(message.to_string());
    let status = StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::BAD_REQUEST);
    (status, err.to_string()).into_response()
}

async fn ping() -> &'static str {
    "pong"
}

/// Seconds from a query value; anything unparseable counts as unset.
fn parse_marker(value: Option<&str>) -> f64 {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_parse_leniently() {
        assert_eq!(parse_marker(Some("12.5")), 12.5);
        assert_eq!(parse_marker(Some(" 90 ")), 90.0);
        assert_eq!(parse_marker(Some("abc")), 0.0);
        assert_eq!(parse_marker(Some("")), 0.0);
        assert_eq!(parse_marker(None), 0.0);
    }
}
