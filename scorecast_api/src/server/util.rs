use axum::http::header::{HeaderName, HeaderValue};
use axum::http::HeaderMap;
use scorecast_core::PlayerId;

use super::error::HttpApiError;

pub(crate) fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert(
        HeaderName::from_static("access-control-allow-origin"),
        HeaderValue::from_static("*"),
    );
    headers.insert(
        HeaderName::from_static("access-control-allow-methods"),
        HeaderValue::from_static("GET,POST,OPTIONS"),
    );
    headers.insert(
        HeaderName::from_static("access-control-allow-headers"),
        HeaderValue::from_static("*"),
    );
    headers.insert(
        HeaderName::from_static("access-control-max-age"),
        HeaderValue::from_static("3600"),
    );
}

pub(crate) fn parse_player_id(raw: &str) -> Result<PlayerId, HttpApiError> {
    raw.trim().parse::<u32>().map(PlayerId).map_err(|_| {
        HttpApiError::invalid_request(
            "player id must be a non-negative integer",
            Some(format!("id={raw}")),
        )
    })
}
