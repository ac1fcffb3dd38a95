pub mod auth;
pub mod metrics;
pub mod password;
pub mod verification;

use axum::extract::ConnectInfo;
use axum::http::HeaderMap;
use std::net::SocketAddr;

use crate::services::RequestContext;

/// Collect the raw request facts the device classifier consumes.
pub(crate) fn request_context(
    headers: &HeaderMap,
    addr: Option<ConnectInfo<SocketAddr>>,
) -> RequestContext {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    RequestContext {
        user_agent: header("user-agent").unwrap_or_default(),
        forwarded_for: header("x-forwarded-for"),
        real_ip: header("x-real-ip"),
        remote_addr: addr.map(|ConnectInfo(a)| a.to_string()),
    }
}
