//! Header manipulation.
//!
//! # Responsibilities
//! - Strip pseudo-headers and hop-by-hop headers from upstream responses
//! - Provide the static CORS response headers
//!
//! # Design Decisions
//! - Filtering produces a new map; the upstream map is never mutated
//! - CORS headers are fixed, not negotiated per origin

use axum::http::{
    header::{
        ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    },
    HeaderMap, HeaderName, HeaderValue,
};

/// Connection-scoped headers that must not be relayed.
pub const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Protocol-reserved names (`:status`, `:path`, ...).
pub fn is_pseudo_header(name: &str) -> bool {
    name.starts_with(':')
}

fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP_HEADERS.contains(&name)
}

/// Copy of `headers` without pseudo-headers and hop-by-hop headers.
pub fn filter_response_headers(headers: &HeaderMap) -> HeaderMap {
    let mut filtered = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let key = name.as_str();
        if is_pseudo_header(key) || is_hop_by_hop(key) {
            continue;
        }
        filtered.append(name.clone(), value.clone());
    }
    filtered
}

/// Static CORS headers added to every response.
pub fn cors_headers() -> [(HeaderName, HeaderValue); 3] {
    [
        (ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*")),
        (
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, OPTIONS"),
        ),
        (
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("authorization, content-type"),
        ),
    ]
}
