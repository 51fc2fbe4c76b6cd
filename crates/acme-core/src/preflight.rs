//! Preflight Verifier (C3): closes the race between the LB datagroup write
//! and the provider's validation GET by polling the public HTTP-01 URL
//! until the LB itself serves the expected key authorization.

use http_body_util::{BodyExt, Empty};
use hyper::body::Bytes;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use std::time::Duration;
use tokio::time::{sleep, Instant};

use crate::prelude::*;

pub const DEFAULT_TIMEOUT_SECS: u64 = 45;
pub const DEFAULT_INTERVAL_MS: u64 = 500;

/// Poll `http://<hostname>/.well-known/acme-challenge/<token>` until it
/// returns 200 with a trimmed body equal to `expected`, or the deadline
/// elapses (`Error::PreflightTimeout`).
pub async fn wait(
	hostname: &str,
	token: &str,
	expected: &str,
	timeout: Duration,
	interval: Duration,
) -> ClResult<()> {
	let client: Client<_, Empty<Bytes>> =
		Client::builder(TokioExecutor::new()).build(HttpConnector::new());
	let uri: hyper::Uri = format!("http://{hostname}/.well-known/acme-challenge/{token}")
		.parse()
		.map_err(|e| Error::ValidationError(format!("invalid preflight uri: {e}")))?;
	let deadline = Instant::now() + timeout;

	loop {
		let req = hyper::Request::builder()
			.method(hyper::Method::GET)
			.uri(uri.clone())
			.body(Empty::<Bytes>::new())
			.map_err(Error::from)?;

		if let Ok(Ok(res)) =
			tokio::time::timeout(deadline.saturating_duration_since(Instant::now()), client.request(req))
				.await
		{
			if res.status() == hyper::StatusCode::OK {
				if let Ok(body) = res.into_body().collect().await {
					let body = body.to_bytes();
					if String::from_utf8_lossy(&body).trim() == expected {
						return Ok(());
					}
				}
			}
		}

		if Instant::now() >= deadline {
			return Err(Error::PreflightTimeout {
				stdout: String::new(),
				stderr: format!("preflight timed out waiting for {hostname} token {token}"),
			});
		}
		sleep(interval.min(deadline.saturating_duration_since(Instant::now()))).await;
	}
}


// vim: ts=4
