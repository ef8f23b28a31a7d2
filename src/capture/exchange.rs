// src/capture/exchange.rs
//! Captured request/response input types
//!
//! One `RequestData`/`ResponseData` pair describes a single completed HTTP
//! exchange as observed by the host server. The pair is created per exchange
//! by the caller, consumed once by the record builder, then discarded.

use bytes::Bytes;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::time::Instant;

/// Captured request half of an HTTP exchange
#[derive(Debug, Clone, Default)]
pub struct RequestData {
    /// HTTP method ("GET", "POST", ...)
    pub method: String,

    /// URI scheme ("http" or "https")
    pub scheme: String,

    /// Host the request was addressed to
    pub host: String,

    /// URI path
    pub path: String,

    /// Raw query string, without the leading '?'
    pub query: String,

    /// Header mapping; keys unique, case preserved as received
    pub headers: HashMap<String, String>,

    /// Raw request body
    pub body: Bytes,

    /// Client IP address
    pub ip: String,

    /// Monotonic request-start timestamp in nanoseconds (0 = unknown)
    pub start_ns: u64,
}

/// Captured response half of an HTTP exchange
#[derive(Debug, Clone, Default)]
pub struct ResponseData {
    /// HTTP status code
    pub status: u16,

    /// Header mapping; keys unique, case preserved as received
    pub headers: HashMap<String, String>,

    /// Raw response body
    pub body: Bytes,

    /// Monotonic response-end timestamp in nanoseconds (0 = unknown)
    pub end_ns: u64,
}

static CLOCK_ANCHOR: Lazy<Instant> = Lazy::new(Instant::now);

/// Nanosecond reading of a process-local monotonic clock, suitable for the
/// `start_ns`/`end_ns` fields. Never returns 0: that value is reserved for
/// "timing unknown".
pub fn monotonic_ns() -> u64 {
    CLOCK_ANCHOR.elapsed().as_nanos().max(1) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let req = RequestData::default();
        assert!(req.method.is_empty());
        assert!(req.host.is_empty());
        assert!(req.path.is_empty());
        assert!(req.headers.is_empty());
        assert!(req.body.is_empty());
        assert_eq!(req.start_ns, 0);
    }

    #[test]
    fn test_response_defaults() {
        let res = ResponseData::default();
        assert_eq!(res.status, 0);
        assert!(res.body.is_empty());
        assert_eq!(res.end_ns, 0);
    }

    #[test]
    fn test_monotonic_ns() {
        let first = monotonic_ns();
        let second = monotonic_ns();
        assert!(first > 0);
        assert!(second >= first);
    }
}
