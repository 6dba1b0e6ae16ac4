//! snipvote/crates/sv-api/src/middleware.rs Middleware
//!
//! Request-origin plumbing and the standard middleware set for the API.

use actix_cors::Cors;
use actix_web::dev::Payload;
use actix_web::middleware::Logger;
use actix_web::{Error, FromRequest, HttpRequest};
use std::future::{ready, Ready};
use std::net::IpAddr;
use sv_core::identity::resolve_client_ip;

/// Resolved client address; `None` when the request carries no usable signal.
///
/// Priority chain per the identity resolver: `X-Real-IP` set by the trusted
/// proxy, then the first `X-Forwarded-For` entry, then the peer socket.
pub struct ClientIp(pub Option<IpAddr>);

impl FromRequest for ClientIp {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let real_ip = header_value(req, "x-real-ip");
        let forwarded_for = header_value(req, "x-forwarded-for");
        let peer = req.peer_addr().map(|addr| addr.ip());
        ready(Ok(ClientIp(resolve_client_ip(
            real_ip.as_deref(),
            forwarded_for.as_deref(),
            peer,
        ))))
    }
}

fn header_value(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

// Returns a standard set of middleware for the Snipvote API.
pub fn standard_middleware() -> Logger {
    // The 'default' logger outputs:
    // remote-ip "request-line" status-code response-size "referrer" "user-agent"
    Logger::default()
}

// Configures CORS (Cross-Origin Resource Sharing)
// Relevant if the UI and API ever live on different subdomains.
pub fn cors_policy() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST"])
        .max_age(3600)
}
