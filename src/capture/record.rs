// src/capture/record.rs
//! Record builder
//!
//! Converts a captured exchange plus timing data into one structured record
//! matching the broker wire format. Building is a pure function: no side
//! effects, never fails, deterministic for a fixed capture timestamp.

use crate::capture::exchange::{RequestData, ResponseData};
use serde::Serialize;
use std::collections::HashMap;

/// One serialized captured HTTP exchange destined for the broker
#[derive(Debug, Clone, Serialize)]
pub struct TrafficRecord {
    /// Account the capture belongs to
    pub account_id: String,

    /// Wall-clock capture time, whole seconds since the Unix epoch
    pub timestamp: i64,

    /// Nested request object
    pub request: RequestRecord,

    /// Nested response object
    pub response: ResponseRecord,

    /// Derived request latency. Present only when both timestamps are known
    /// and end > start; absence means "unknown latency", never zero.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// Request sub-object of the wire record
#[derive(Debug, Clone, Serialize)]
pub struct RequestRecord {
    pub method: String,
    pub scheme: String,
    pub host: String,
    pub path: String,
    pub query: String,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub body_b64: String,
    pub ip: String,
}

/// Response sub-object of the wire record
#[derive(Debug, Clone, Serialize)]
pub struct ResponseRecord {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub body_b64: String,
}

/// Builds traffic records for a fixed account
pub struct RecordBuilder {
    account_id: String,
}

impl RecordBuilder {
    /// Create a builder stamping records with the given account id
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
        }
    }

    /// Build a record from a captured exchange, stamped with the current
    /// wall-clock time.
    pub fn build(&self, request: RequestData, response: ResponseData) -> TrafficRecord {
        self.build_at(request, response, chrono::Utc::now().timestamp())
    }

    /// Like [`build`](Self::build), with an explicit capture timestamp.
    ///
    /// Header mappings are copied verbatim, no name normalization. The raw
    /// body is kept in a human-readable field (`body`, lossy UTF-8) and a
    /// binary-safe field (`body_b64`) so downstream consumers can choose.
    pub fn build_at(
        &self,
        request: RequestData,
        response: ResponseData,
        timestamp: i64,
    ) -> TrafficRecord {
        let latency_ms = latency_ms(request.start_ns, response.end_ns);

        TrafficRecord {
            account_id: self.account_id.clone(),
            timestamp,
            request: RequestRecord {
                method: request.method,
                scheme: request.scheme,
                host: request.host,
                path: request.path,
                query: request.query,
                headers: request.headers,
                body: String::from_utf8_lossy(&request.body).into_owned(),
                body_b64: base64::encode(&request.body),
                ip: request.ip,
            },
            response: ResponseRecord {
                status: response.status,
                headers: response.headers,
                body: String::from_utf8_lossy(&response.body).into_owned(),
                body_b64: base64::encode(&response.body),
            },
            latency_ms,
        }
    }
}

/// Derive latency from a monotonic timestamp pair. The strict `end > start`
/// check keeps a corrupt inverted pair from underflowing into a huge value.
fn latency_ms(start_ns: u64, end_ns: u64) -> Option<u64> {
    if start_ns != 0 && end_ns != 0 && end_ns > start_ns {
        Some((end_ns - start_ns) / 1_000_000)
    } else {
        None
    }
}
