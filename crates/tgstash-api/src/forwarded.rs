//! Request provenance behind reverse proxies: public origin, client IP, user agent.

use axum::http::{HeaderMap, header};
use std::net::SocketAddr;
use tgstash_common::config::ServerConfig;

/// Headers consulted for the client address, most specific first.
const CLIENT_IP_HEADERS: [&str; 3] = ["cf-connecting-ip", "x-forwarded-for", "x-real-ip"];

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Base for generated file URLs: the configured public URL, else the request origin.
pub fn base_url(server: &ServerConfig, headers: &HeaderMap) -> String {
    match server.public_base_url() {
        Some(url) => url.to_owned(),
        None => request_origin(headers),
    }
}

/// `scheme://host` as seen by the client.
pub fn request_origin(headers: &HeaderMap) -> String {
    let scheme = header_str(headers, "x-forwarded-proto")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .unwrap_or("http");
    let host = header_str(headers, "x-forwarded-host")
        .or_else(|| header_str(headers, header::HOST.as_str()))
        .unwrap_or("localhost");
    format!("{scheme}://{host}")
}

/// Best-effort client address, empty when nothing is known.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    CLIENT_IP_HEADERS
        .iter()
        .find_map(|name| header_str(headers, name))
        .map(str::to_owned)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_default()
}

pub fn user_agent(headers: &HeaderMap) -> String {
    header_str(headers, header::USER_AGENT.as_str())
        .unwrap_or_default()
        .to_owned()
}
