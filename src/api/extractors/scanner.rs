use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::request::Parts,
};
use std::convert::Infallible;
use std::net::SocketAddr;

const UNKNOWN_SCANNER: &str = "unknown";

/// Network origin of the device submitting a scan, recorded in the audit log.
pub struct ScannerInfo(pub String);

impl<S> FromRequestParts<S> for ScannerInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts.headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        if let Some(origin) = forwarded {
            return Ok(ScannerInfo(origin.to_string()));
        }

        let origin = parts.extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| UNKNOWN_SCANNER.to_string());

        Ok(ScannerInfo(origin))
    }
}
