//! # Identity Resolution
//!
//! Derives the canonical client address from request origin metadata.
//! Priority: trusted proxy real-IP header, then the first forwarded-for
//! entry, then the transport peer address. A signal that is present but
//! unparsable falls through to the next one instead of failing.

use std::net::IpAddr;

/// Resolves the client address, or `None` when no usable signal exists.
/// Callers must treat `None` as anonymous: no gating, no personalization.
pub fn resolve_client_ip(
    real_ip: Option<&str>,
    forwarded_for: Option<&str>,
    peer: Option<IpAddr>,
) -> Option<IpAddr> {
    if let Some(ip) = real_ip.and_then(parse_addr) {
        return Some(ip);
    }
    if let Some(ip) = forwarded_for
        .and_then(|header| header.split(',').next())
        .and_then(parse_addr)
    {
        return Some(ip);
    }
    peer
}

fn parse_addr(raw: &str) -> Option<IpAddr> {
    raw.trim().parse().ok()
}
