//! Header propagation between inbound, outbound and relayed messages.
//!
//! Copies are additive: every `(name, value)` pair is appended, so repeated
//! headers keep their count and order. Nothing is renamed or deduplicated.

use axum::http::header::{CONNECTION, HOST};
use axum::http::{HeaderMap, HeaderName};

/// Hop-by-hop headers per RFC 7230 §6.1, plus the legacy `proxy-connection`.
pub const HOP_BY_HOP: &[&str] = &[
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

/// Append every inbound request header onto the outbound request.
///
/// `Host` names the proxy's own authority; the client sets it from the
/// target URL instead.
pub fn copy_request_headers(src: &HeaderMap, dst: &mut HeaderMap, strip_hop_by_hop: bool) {
    let skip = connection_tokens(src, strip_hop_by_hop);
    for (name, value) in src.iter() {
        if name == HOST || skip_header(name, &skip, strip_hop_by_hop) {
            continue;
        }
        dst.append(name.clone(), value.clone());
    }
}

/// Append every origin response header onto the relayed response.
pub fn copy_response_headers(src: &HeaderMap, dst: &mut HeaderMap, strip_hop_by_hop: bool) {
    let skip = connection_tokens(src, strip_hop_by_hop);
    for (name, value) in src.iter() {
        if skip_header(name, &skip, strip_hop_by_hop) {
            continue;
        }
        dst.append(name.clone(), value.clone());
    }
}

fn skip_header(name: &HeaderName, listed: &[String], strip_hop_by_hop: bool) -> bool {
    strip_hop_by_hop
        && (HOP_BY_HOP.contains(&name.as_str()) || listed.iter().any(|l| l == name.as_str()))
}

/// Header names nominated as hop-by-hop by the `Connection` header.
fn connection_tokens(headers: &HeaderMap, strip_hop_by_hop: bool) -> Vec<String> {
    if !strip_hop_by_hop {
        return Vec::new();
    }
    headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|token| token.trim().to_ascii_lowercase())
        .filter(|token| !token.is_empty())
        .collect()
}
