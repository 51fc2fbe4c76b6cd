//! LB Adapter (C4): iControl REST client for a BIG-IP-style load balancer.
//!
//! TLS verification to the management plane is a single constructor flag,
//! not a per-call argument, per the design note on mgmt-plane self-signed
//! certs.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

mod danger;

use acme_types::lb_adapter::{plan_chunks, LbAdapter};
use acme_types::prelude::*;
use async_trait::async_trait;
use base64::Engine;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::StatusCode;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tokio::time::timeout;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CHUNK_SIZE: u64 = 1_048_576; // 1 MiB

type HttpClient = Client<HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>, Full<Bytes>>;

pub struct BigipAdapter {
	client: HttpClient,
	base_url: String,
	auth_header: String,
}

impl fmt::Debug for BigipAdapter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("BigipAdapter").field("base_url", &self.base_url).finish()
	}
}

impl BigipAdapter {
	/// `verify_tls = false` disables certificate validation against the
	/// management plane (self-signed appliance certs).
	pub fn new(host: &str, user: &str, password: &str, verify_tls: bool) -> ClResult<Self> {
		let connector = if verify_tls {
			HttpsConnectorBuilder::new()
				.with_native_roots()
				.map_err(|_| Error::ConfigError("no native root CA certificates found".into()))?
				.https_only()
				.enable_http1()
				.build()
		} else {
			HttpsConnectorBuilder::new()
				.with_tls_config(danger::no_verification_tls_config()?)
				.https_only()
				.enable_http1()
				.build()
		};
		let client = Client::builder(TokioExecutor::new()).build(connector);

		let credentials = base64::engine::general_purpose::STANDARD.encode(format!("{user}:{password}"));
		Ok(BigipAdapter {
			client,
			base_url: format!("https://{host}"),
			auth_header: format!("Basic {credentials}"),
		})
	}

	async fn request(
		&self,
		method: hyper::Method,
		path: &str,
		body: Option<Value>,
		extra_headers: &[(&str, String)],
	) -> ClResult<(StatusCode, Bytes)> {
		let body_bytes = match &body {
			Some(v) => serde_json::to_vec(v)?,
			None => Vec::new(),
		};
		self.request_raw(method, path, Bytes::from(body_bytes), "application/json", extra_headers).await
	}

	async fn request_raw(
		&self,
		method: hyper::Method,
		path: &str,
		body: Bytes,
		content_type: &str,
		extra_headers: &[(&str, String)],
	) -> ClResult<(StatusCode, Bytes)> {
		let mut builder = hyper::Request::builder()
			.method(method)
			.uri(format!("{}{}", self.base_url, path))
			.header("Authorization", &self.auth_header)
			.header("Content-Type", content_type);
		for (k, v) in extra_headers {
			builder = builder.header(*k, v);
		}
		let req = builder.body(Full::new(body)).map_err(Error::from)?;

		let res = timeout(REQUEST_TIMEOUT, self.client.request(req))
			.await
			.map_err(|_| Error::LbApiError("request timed out".into()))?
			.map_err(|e| Error::LbApiError(format!("transport error: {e}")))?;
		let status = res.status();
		let body = res
			.into_body()
			.collect()
			.await
			.map_err(|e| Error::LbApiError(format!("body read error: {e}")))?
			.to_bytes();
		Ok((status, body))
	}

	async fn get_json(&self, path: &str) -> ClResult<(StatusCode, Value)> {
		let (status, body) = self.request(hyper::Method::GET, path, None, &[]).await?;
		let value = if body.is_empty() { Value::Null } else { serde_json::from_slice(&body)? };
		Ok((status, value))
	}

	async fn run_bash(&self, command: &str) -> ClResult<()> {
		let (status, body) = self
			.request(
				hyper::Method::POST,
				"/mgmt/tm/util/bash",
				Some(json!({"command": "run", "utilCmdArgs": format!("-c \"{command}\"")})),
				&[],
			)
			.await?;
		if !status.is_success() {
			return Err(Error::LbApiError(format!(
				"tmsh bash utility failed: {status} {}",
				String::from_utf8_lossy(&body)
			)));
		}
		Ok(())
	}
}

#[derive(Deserialize)]
struct DataGroupRecord {
	name: String,
	data: String,
}

#[derive(Serialize)]
struct DataGroupRecordOut<'a> {
	name: &'a str,
	data: &'a str,
}

#[async_trait]
impl LbAdapter for BigipAdapter {
	async fn chunked_upload(&self, name: &str, bytes: &[u8]) -> ClResult<String> {
		let encoded_name = urlencoding::encode(name);
		let total = bytes.len() as u64;
		for range in plan_chunks(total, CHUNK_SIZE) {
			let chunk = Bytes::copy_from_slice(&bytes[range.start as usize..range.end as usize]);
			let (status, _) = self
				.request_raw(
					hyper::Method::POST,
					&format!("/mgmt/shared/file-transfer/uploads/{encoded_name}"),
					chunk,
					"application/octet-stream",
					&[("Content-Range", range.header_value())],
				)
				.await?;
			if !matches!(status, StatusCode::OK | StatusCode::CREATED) {
				return Err(Error::LbApiError(format!("chunked upload failed with status {status}")));
			}
		}
		Ok(format!("/var/config/rest/downloads/{name}"))
	}

	async fn install_ssl_key(&self, partition: &str, name: &str, source_path: &str) -> ClResult<String> {
		let (status, body) = self
			.request(
				hyper::Method::POST,
				"/mgmt/tm/sys/file/ssl-key",
				Some(json!({"name": name, "partition": partition, "source-path": format!("file:{source_path}")})),
				&[],
			)
			.await?;
		if !status.is_success() {
			return Err(Error::LbApiError(format!(
				"install_ssl_key failed: {status} {}",
				String::from_utf8_lossy(&body)
			)));
		}
		Ok(format!("/{partition}/{name}"))
	}

	async fn install_ssl_cert(&self, partition: &str, name: &str, source_path: &str) -> ClResult<String> {
		let (status, body) = self
			.request(
				hyper::Method::POST,
				"/mgmt/tm/sys/file/ssl-cert",
				Some(json!({"name": name, "partition": partition, "source-path": format!("file:{source_path}")})),
				&[],
			)
			.await?;
		if !status.is_success() {
			return Err(Error::LbApiError(format!(
				"install_ssl_cert failed: {status} {}",
				String::from_utf8_lossy(&body)
			)));
		}
		Ok(format!("/{partition}/{name}"))
	}

	async fn ensure_client_ssl_profile(
		&self,
		partition: &str,
		name: &str,
		defaults_from: &str,
	) -> ClResult<String> {
		let path = format!("/mgmt/tm/ltm/profile/client-ssl/~{partition}~{name}");
		let (status, _) = self.get_json(&path).await?;
		if status == StatusCode::NOT_FOUND {
			let (status, body) = self
				.request(
					hyper::Method::POST,
					"/mgmt/tm/ltm/profile/client-ssl",
					Some(json!({"name": name, "partition": partition, "defaultsFrom": defaults_from})),
					&[],
				)
				.await?;
			if !status.is_success() {
				return Err(Error::LbApiError(format!(
					"ensure_client_ssl_profile create failed: {status} {}",
					String::from_utf8_lossy(&body)
				)));
			}
		} else if status != StatusCode::OK {
			return Err(Error::LbApiError(format!("ensure_client_ssl_profile GET failed: {status}")));
		}
		Ok(format!("/{partition}/{name}"))
	}

	async fn attach_key_cert_chain(
		&self,
		profile_fq: &str,
		key_fq: &str,
		cert_fq: &str,
		chain_fq: &str,
	) -> ClResult<()> {
		let encoded = profile_fq.replace('/', "~");
		let path = format!("/mgmt/tm/ltm/profile/client-ssl/{encoded}");
		let (status, body) = self
			.request(
				hyper::Method::PATCH,
				&path,
				Some(json!({
					"certKeyChain": [{"name": "default", "key": key_fq, "cert": cert_fq, "chain": chain_fq}]
				})),
				&[],
			)
			.await?;
		if status.is_success() {
			return Ok(());
		}
		warn!(%status, body = %String::from_utf8_lossy(&body), "client-ssl PATCH failed, falling back to tmsh");
		self.run_bash(&format!(
			"tmsh modify ltm profile client-ssl {profile_fq} cert-key-chain replace-all-with {{ default {{ key {key_fq} cert {cert_fq} chain {chain_fq} }} }}"
		))
		.await
	}

	async fn attach_profile_to_virtual(&self, vs_fq: &str, profile_fq: &str) -> ClResult<()> {
		self.run_bash(&format!(
			"tmsh modify ltm virtual {vs_fq} profiles add {{ {profile_fq} {{ context clientside }} }}"
		))
		.await
	}

	async fn replace_clientssl_profiles(&self, vs_fq: &str) -> ClResult<()> {
		let (status, value) =
			self.get_json(&format!("/mgmt/tm/ltm/virtual/{}/profiles", vs_fq.replace('/', "~"))).await?;
		if status != StatusCode::OK {
			return Err(Error::LbApiError(format!("listing virtual server profiles failed: {status}")));
		}
		let items = value.get("items").and_then(Value::as_array).cloned().unwrap_or_default();
		let to_remove: Vec<String> = items
			.iter()
			.filter_map(|item| item.get("fullPath").and_then(Value::as_str))
			.filter(|path| path.contains("client-ssl"))
			.map(str::to_string)
			.collect();
		if to_remove.is_empty() {
			return Ok(());
		}
		let entries = to_remove.iter().map(|p| format!("{p} {{ }}")).collect::<Vec<_>>().join(" ");
		self.run_bash(&format!("tmsh modify ltm virtual {vs_fq} profiles delete {{ {entries} }}")).await
	}

	async fn datagroup_upsert(
		&self,
		partition: &str,
		name: &str,
		entries: BTreeMap<String, String>,
	) -> ClResult<()> {
		let path = format!("/mgmt/tm/ltm/data-group/internal/~{partition}~{name}");
		let (status, value) = self.get_json(&path).await?;

		let mut existing: BTreeMap<String, String> = if status == StatusCode::OK {
			value
				.get("records")
				.and_then(Value::as_array)
				.cloned()
				.unwrap_or_default()
				.into_iter()
				.filter_map(|v| serde_json::from_value::<DataGroupRecord>(v).ok())
				.map(|r| (r.name, r.data))
				.collect()
		} else {
			BTreeMap::new()
		};

		let changed = entries.iter().any(|(k, v)| existing.get(k) != Some(v));
		if !changed && status == StatusCode::OK {
			return Ok(());
		}
		merge_keep_unrelated(&mut existing, entries);

		let records: Vec<DataGroupRecordOut<'_>> =
			existing.iter().map(|(name, data)| DataGroupRecordOut { name, data }).collect();

		if status == StatusCode::NOT_FOUND {
			let (status, body) = self
				.request(
					hyper::Method::POST,
					"/mgmt/tm/ltm/data-group/internal",
					Some(json!({"name": name, "partition": partition, "type": "string", "records": records})),
					&[],
				)
				.await?;
			if !status.is_success() {
				return Err(Error::LbApiError(format!(
					"datagroup create failed: {status} {}",
					String::from_utf8_lossy(&body)
				)));
			}
			return Ok(());
		}

		self.patch_datagroup(&path, &records).await
	}

	async fn datagroup_delete(&self, partition: &str, name: &str, tokens: &[String]) -> ClResult<()> {
		let path = format!("/mgmt/tm/ltm/data-group/internal/~{partition}~{name}");
		let (status, value) = self.get_json(&path).await?;
		if status != StatusCode::OK {
			return Ok(()); // nothing to delete from
		}
		let mut existing: BTreeMap<String, String> = value
			.get("records")
			.and_then(Value::as_array)
			.cloned()
			.unwrap_or_default()
			.into_iter()
			.filter_map(|v| serde_json::from_value::<DataGroupRecord>(v).ok())
			.map(|r| (r.name, r.data))
			.collect();
		let before = existing.len();
		for token in tokens {
			existing.remove(token);
		}
		if existing.len() == before {
			return Ok(());
		}
		let records: Vec<DataGroupRecordOut<'_>> =
			existing.iter().map(|(name, data)| DataGroupRecordOut { name, data }).collect();
		self.patch_datagroup(&path, &records).await
	}
}

/// Merge `incoming` over `existing` in place, touching only the keys the
/// writer is publishing. Rows outside `incoming` are left untouched.
fn merge_keep_unrelated(existing: &mut BTreeMap<String, String>, incoming: BTreeMap<String, String>) {
	existing.extend(incoming);
}

impl BigipAdapter {
	async fn patch_datagroup(&self, path: &str, records: &[DataGroupRecordOut<'_>]) -> ClResult<()> {
		for attempt in 0..2 {
			let (status, body) =
				self.request(hyper::Method::PATCH, path, Some(json!({"records": records})), &[]).await?;
			if status.is_success() {
				return Ok(());
			}
			if matches!(status, StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED) && attempt == 0 {
				continue;
			}
			return Err(Error::LbApiError(format!(
				"datagroup patch failed: {status} {}",
				String::from_utf8_lossy(&body)
			)));
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

	use super::*;
	use tokio::io::{AsyncReadExt, AsyncWriteExt};
	use tokio::net::{TcpListener, TcpStream};

	impl BigipAdapter {
		/// Plain-HTTP variant for pointing at an in-process mock server;
		/// `https_only()` would refuse the loopback `http://` URL tests use.
		fn for_test(base_url: String) -> Self {
			let connector = HttpsConnectorBuilder::new()
				.with_native_roots()
				.expect("native roots available in test env")
				.https_or_http()
				.enable_http1()
				.build();
			let client = Client::builder(TokioExecutor::new()).build(connector);
			BigipAdapter { client, base_url, auth_header: "Basic dGVzdDp0ZXN0".to_string() }
		}
	}

	fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
		haystack.windows(needle.len()).position(|w| w == needle)
	}

	/// Reads one HTTP/1.1 request off `stream` and returns (path, body).
	async fn read_request(stream: &mut TcpStream) -> (String, String) {
		let mut buf = Vec::new();
		let mut chunk = [0u8; 4096];
		let header_end = loop {
			let n = stream.read(&mut chunk).await.expect("read request");
			buf.extend_from_slice(&chunk[..n]);
			if let Some(pos) = find(&buf, b"\r\n\r\n") {
				break pos;
			}
		};
		let header_str = String::from_utf8_lossy(&buf[..header_end]).to_string();
		let path = header_str
			.lines()
			.next()
			.and_then(|line| line.split_whitespace().nth(1))
			.unwrap_or_default()
			.to_string();
		let content_length: usize = header_str
			.lines()
			.find_map(|l| {
				let (k, v) = l.split_once(':')?;
				(k.trim().eq_ignore_ascii_case("content-length")).then(|| v.trim().parse().unwrap_or(0))
			})
			.unwrap_or(0);
		let mut body = buf[header_end + 4..].to_vec();
		while body.len() < content_length {
			let n = stream.read(&mut chunk).await.expect("read body");
			if n == 0 {
				break;
			}
			body.extend_from_slice(&chunk[..n]);
		}
		(path, String::from_utf8_lossy(&body).to_string())
	}

	async fn respond(stream: &mut TcpStream, status_line: &str) {
		let response = format!("{status_line}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
		stream.write_all(response.as_bytes()).await.expect("write response");
		stream.shutdown().await.expect("shutdown");
	}

	#[tokio::test]
	async fn falls_back_to_tmsh_when_the_clientssl_patch_is_rejected() {
		let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock server");
		let addr = listener.local_addr().expect("local addr");

		let (tx, rx) = tokio::sync::oneshot::channel();
		tokio::spawn(async move {
			let (mut first, _) = listener.accept().await.expect("accept patch");
			let _ = read_request(&mut first).await;
			respond(&mut first, "HTTP/1.1 409 Conflict").await;

			let (mut second, _) = listener.accept().await.expect("accept tmsh fallback");
			let (path, body) = read_request(&mut second).await;
			respond(&mut second, "HTTP/1.1 200 OK").await;
			let _ = tx.send((path, body));
		});

		let adapter = BigipAdapter::for_test(format!("http://{addr}"));
		adapter
			.attach_key_cert_chain("/Common/clientssl_a_example_com", "/Common/a.key", "/Common/a.crt", "/Common/a_chain.crt")
			.await
			.expect("fallback should succeed once tmsh reports 200");

		let (path, body) = rx.await.expect("mock server captured the fallback request");
		assert_eq!(path, "/mgmt/tm/util/bash");
		assert!(body.contains("cert-key-chain replace-all-with"));
		let key_pos = body.find("key /Common/a.key").expect("key field present");
		let cert_pos = body.find("cert /Common/a.crt").expect("cert field present");
		let chain_pos = body.find("chain /Common/a_chain.crt").expect("chain field present");
		assert!(key_pos < cert_pos && cert_pos < chain_pos, "tmsh fallback must emit key/cert/chain order");
	}

	#[test]
	fn merge_preserves_rows_outside_the_writer_token_set() {
		let mut existing = BTreeMap::from([
			("TOKEN_A".to_string(), "A.KA".to_string()),
			("TOKEN_B".to_string(), "B.KA".to_string()),
		]);
		let incoming = BTreeMap::from([("TOKEN_C".to_string(), "C.KA".to_string())]);
		merge_keep_unrelated(&mut existing, incoming);

		assert_eq!(existing.get("TOKEN_A"), Some(&"A.KA".to_string()));
		assert_eq!(existing.get("TOKEN_B"), Some(&"B.KA".to_string()));
		assert_eq!(existing.get("TOKEN_C"), Some(&"C.KA".to_string()));
	}

	#[test]
	fn merge_overwrites_only_colliding_keys() {
		let mut existing = BTreeMap::from([("TOKEN_A".to_string(), "stale".to_string())]);
		let incoming = BTreeMap::from([("TOKEN_A".to_string(), "fresh".to_string())]);
		merge_keep_unrelated(&mut existing, incoming);
		assert_eq!(existing.get("TOKEN_A"), Some(&"fresh".to_string()));
	}
}

// vim: ts=4
