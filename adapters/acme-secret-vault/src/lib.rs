//! Secret Store Adapter (C5): KV-v2 client over a Vault-style secret store.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

use acme_types::prelude::*;
use acme_types::secret_adapter::{normalize_path, SecretStoreAdapter};
use async_trait::async_trait;
use http_body_util::{combinators::BoxBody, BodyExt, Empty, Full};
use hyper::body::Bytes;
use hyper::StatusCode;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use rustls::{ClientConfig, RootCertStore};
use rustls::crypto::CryptoProvider;
use rustls_pki_types::CertificateDer;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tokio::time::timeout;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

type HttpsClient = Client<HttpsConnector<HttpConnector>, BoxBody<Bytes, std::convert::Infallible>>;

fn empty_body() -> BoxBody<Bytes, std::convert::Infallible> {
	Empty::new().boxed()
}

fn full_body(bytes: Vec<u8>) -> BoxBody<Bytes, std::convert::Infallible> {
	Full::new(Bytes::from(bytes)).boxed()
}

/// Parse one or more `-----BEGIN CERTIFICATE-----` blocks out of a PEM file
/// and load them into a root store for `VAULT_CACERT`-pinned verification.
fn load_root_store(pem_path: &str) -> ClResult<RootCertStore> {
	use base64::Engine;

	let pem = std::fs::read_to_string(pem_path)
		.map_err(|e| Error::ConfigError(format!("failed to read VAULT_CACERT {pem_path}: {e}")))?;

	let mut store = RootCertStore::empty();
	let mut in_block = false;
	let mut b64 = String::new();
	for line in pem.lines() {
		match line.trim() {
			"-----BEGIN CERTIFICATE-----" => {
				in_block = true;
				b64.clear();
			}
			"-----END CERTIFICATE-----" => {
				in_block = false;
				let der = base64::engine::general_purpose::STANDARD
					.decode(&b64)
					.map_err(|e| Error::ConfigError(format!("invalid base64 in {pem_path}: {e}")))?;
				store
					.add(CertificateDer::from(der))
					.map_err(|e| Error::ConfigError(format!("invalid certificate in {pem_path}: {e}")))?;
			}
			l if in_block => b64.push_str(l),
			_ => {}
		}
	}
	if store.is_empty() {
		return Err(Error::ConfigError(format!("no certificates found in VAULT_CACERT {pem_path}")));
	}
	Ok(store)
}

pub struct VaultAdapter {
	client: HttpsClient,
	addr: String,
	token: String,
}

impl fmt::Debug for VaultAdapter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("VaultAdapter").field("addr", &self.addr).finish()
	}
}

impl VaultAdapter {
	/// `cacert`, when set, pins verification to that PEM file instead of the
	/// system's native root store (`VAULT_CACERT`).
	pub fn new(addr: &str, token: &str, cacert: Option<&str>) -> ClResult<Self> {
		let connector = match cacert {
			Some(path) => {
				let provider = CryptoProvider::get_default()
					.cloned()
					.ok_or_else(|| Error::ConfigError("no rustls crypto provider installed".into()))?;
				let root_store = load_root_store(path)?;
				let config = ClientConfig::builder_with_provider(provider)
					.with_safe_default_protocol_versions()
					.map_err(|e| Error::ConfigError(format!("invalid tls protocol versions: {e}")))?
					.with_root_certificates(root_store)
					.with_no_client_auth();
				HttpsConnectorBuilder::new().with_tls_config(config).https_only().enable_http1().build()
			}
			None => HttpsConnectorBuilder::new()
				.with_native_roots()
				.map_err(|_| Error::ConfigError("no native root CA certificates found".into()))?
				.https_only()
				.enable_http1()
				.build(),
		};
		let client = Client::builder(TokioExecutor::new()).build(connector);
		Ok(VaultAdapter { client, addr: addr.trim_end_matches('/').to_string(), token: token.to_string() })
	}
}

#[async_trait]
impl SecretStoreAdapter for VaultAdapter {
	async fn read(&self, path: &str) -> ClResult<HashMap<String, String>> {
		let leaf = normalize_path(path);
		let uri = format!("{}/v1/secret/data/{}", self.addr, leaf);
		let req = hyper::Request::builder()
			.method(hyper::Method::GET)
			.uri(uri)
			.header("X-Vault-Token", &self.token)
			.body(empty_body())
			.map_err(Error::from)?;

		let res = timeout(REQUEST_TIMEOUT, self.client.request(req))
			.await
			.map_err(|_| Error::SecretStoreError("request timed out".into()))?
			.map_err(|e| Error::SecretStoreError(format!("transport error: {e}")))?;

		if res.status() == StatusCode::NOT_FOUND {
			return Ok(HashMap::new());
		}
		if !res.status().is_success() {
			return Err(Error::SecretStoreError(format!("read failed with status {}", res.status())));
		}
		let body = res
			.into_body()
			.collect()
			.await
			.map_err(|e| Error::SecretStoreError(format!("body read error: {e}")))?
			.to_bytes();
		let value: Value = serde_json::from_slice(&body)?;
		let data = value
			.get("data")
			.and_then(|d| d.get("data"))
			.cloned()
			.unwrap_or(Value::Object(serde_json::Map::new()));
		let map: HashMap<String, String> = serde_json::from_value(data).unwrap_or_default();
		Ok(map)
	}

	async fn write(&self, path: &str, body: HashMap<String, String>) -> ClResult<()> {
		let leaf = normalize_path(path);
		let uri = format!("{}/v1/secret/data/{}", self.addr, leaf);
		let payload = serde_json::to_vec(&json!({"data": body}))?;
		let req = hyper::Request::builder()
			.method(hyper::Method::POST)
			.uri(uri)
			.header("X-Vault-Token", &self.token)
			.header("Content-Type", "application/json")
			.body(full_body(payload))
			.map_err(Error::from)?;

		let res = timeout(REQUEST_TIMEOUT, self.client.request(req))
			.await
			.map_err(|_| Error::SecretStoreError("request timed out".into()))?
			.map_err(|e| Error::SecretStoreError(format!("transport error: {e}")))?;
		if !res.status().is_success() {
			return Err(Error::SecretStoreError(format!("write failed with status {}", res.status())));
		}
		Ok(())
	}

	async fn delete(&self, path: &str) -> ClResult<()> {
		let leaf = normalize_path(path);
		let uri = format!("{}/v1/secret/data/{}", self.addr, leaf);
		let req = hyper::Request::builder()
			.method(hyper::Method::DELETE)
			.uri(uri)
			.header("X-Vault-Token", &self.token)
			.body(empty_body())
			.map_err(Error::from)?;

		let res = timeout(REQUEST_TIMEOUT, self.client.request(req))
			.await
			.map_err(|_| Error::SecretStoreError("request timed out".into()))?
			.map_err(|e| Error::SecretStoreError(format!("transport error: {e}")))?;
		if !res.status().is_success() && res.status() != StatusCode::NOT_FOUND {
			return Err(Error::SecretStoreError(format!("delete failed with status {}", res.status())));
		}
		Ok(())
	}
}


// vim: ts=4
