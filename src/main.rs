// src/main.rs
//! Demo echo server with traffic capture
//!
//! Serves a plain echo endpoint over HTTP/1.1 and relays every completed
//! exchange through the pipeline to a logging broker, so the SDK can be
//! watched end to end without any infrastructure:
//!
//! ```text
//! RUST_LOG=debug cargo run
//! curl -d 'hello' http://127.0.0.1:8080/echo
//! ```

use anyhow::Result;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::{HeaderValue, CONTENT_TYPE, HOST};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{HeaderMap, Request, Response};
use hyper_util::rt::TokioIo;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use traffic_relay::{
    monotonic_ns, CaptureHandle, LogBroker, RequestData, ResponseData, SdkConfig, TrafficPipeline,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting traffic relay demo v{}", traffic_relay::VERSION);

    let mut pipeline = TrafficPipeline::new(SdkConfig::default(), Arc::new(LogBroker));
    pipeline.start()?;
    let capture = pipeline.handle();

    let addr: SocketAddr = "127.0.0.1:8080".parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!("Echo server listening on {}", addr);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        let capture = capture.clone();
                        tokio::spawn(async move {
                            let io = TokioIo::new(stream);
                            let service = service_fn(move |req| {
                                let capture = capture.clone();
                                async move { echo(req, capture, peer).await }
                            });
                            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                                error!("Connection error: {}", e);
                            }
                        });
                    }
                    Err(e) => error!("Failed to accept connection: {}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal, draining pipeline");
                break;
            }
        }
    }

    pipeline.stop().await;
    let stats = pipeline.stats();
    info!(
        records_enqueued = stats.records_enqueued,
        records_delivered = stats.records_delivered,
        records_lost = stats.records_lost,
        "Pipeline drained"
    );

    Ok(())
}

/// Echo the request body back and capture the exchange
async fn echo(
    req: Request<Incoming>,
    capture: CaptureHandle,
    peer: SocketAddr,
) -> std::result::Result<Response<Full<Bytes>>, hyper::Error> {
    let start_ns = monotonic_ns();
    let (parts, body) = req.into_parts();

    let scheme = header_value(&parts.headers, "x-forwarded-proto")
        .unwrap_or_else(|| "http".to_string());
    let host = parts
        .uri
        .host()
        .map(str::to_string)
        .or_else(|| {
            header_value(&parts.headers, HOST.as_str())
                .map(|h| h.split(':').next().unwrap_or(&h).to_string())
        })
        .unwrap_or_default();

    let body = body.collect().await?.to_bytes();

    let request = RequestData {
        method: parts.method.to_string(),
        scheme,
        host,
        path: parts.uri.path().to_string(),
        query: parts.uri.query().unwrap_or_default().to_string(),
        headers: header_map(&parts.headers),
        body: body.clone(),
        ip: peer.ip().to_string(),
        start_ns,
    };

    let mut response = Response::new(Full::new(body.clone()));
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );

    let captured_response = ResponseData {
        status: response.status().as_u16(),
        headers: header_map(response.headers()),
        body,
        end_ns: monotonic_ns(),
    };

    // Fire-and-forget: capture cost on the request path is one queue handoff
    capture.capture(request, captured_response);

    Ok(response)
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn header_map(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}
