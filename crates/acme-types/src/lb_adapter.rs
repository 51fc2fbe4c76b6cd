//! Adapter over the load-balancer's iControl-style REST management plane
//! (component C4).

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::error::ClResult;

/// A single chunk of an upload, used only to make the "no gaps/overlaps,
/// sum == total, last end-1 == total-1" invariant independently testable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentRange {
	pub start: u64,
	pub end: u64, // exclusive
	pub total: u64,
}

impl ContentRange {
	/// The `Content-Range` header value: `<start>-<end-1>/<total>` (no `bytes ` prefix, end inclusive).
	pub fn header_value(&self) -> String {
		format!("{}-{}/{}", self.start, self.end - 1, self.total)
	}
}

/// Split `total` bytes into chunks no larger than `chunk_size`.
pub fn plan_chunks(total: u64, chunk_size: u64) -> Vec<ContentRange> {
	if total == 0 {
		return vec![ContentRange { start: 0, end: 0, total: 0 }];
	}
	let mut chunks = Vec::new();
	let mut start = 0;
	while start < total {
		let end = (start + chunk_size).min(total);
		chunks.push(ContentRange { start, end, total });
		start = end;
	}
	chunks
}

#[async_trait]
pub trait LbAdapter: Debug + Send + Sync {
	/// Upload `bytes` under `name` via chunked `POST`s, returning the
	/// `/var/config/rest/downloads/<name>` source path.
	async fn chunked_upload(&self, name: &str, bytes: &[u8]) -> ClResult<String>;
	async fn install_ssl_key(&self, partition: &str, name: &str, source_path: &str) -> ClResult<String>;
	async fn install_ssl_cert(&self, partition: &str, name: &str, source_path: &str) -> ClResult<String>;
	/// Returns the fully-qualified `/partition/name` profile path.
	async fn ensure_client_ssl_profile(
		&self,
		partition: &str,
		name: &str,
		defaults_from: &str,
	) -> ClResult<String>;
	async fn attach_key_cert_chain(
		&self,
		profile_fq: &str,
		key_fq: &str,
		cert_fq: &str,
		chain_fq: &str,
	) -> ClResult<()>;
	async fn attach_profile_to_virtual(&self, vs_fq: &str, profile_fq: &str) -> ClResult<()>;
	/// Delete all clientside profiles on `vs_fq` whose `fullPath` contains
	/// `client-ssl`, as one batched `tmsh` call.
	async fn replace_clientssl_profiles(&self, vs_fq: &str) -> ClResult<()>;
	async fn datagroup_upsert(
		&self,
		partition: &str,
		name: &str,
		entries: BTreeMap<String, String>,
	) -> ClResult<()>;
	async fn datagroup_delete(&self, partition: &str, name: &str, tokens: &[String]) -> ClResult<()>;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn chunk_plan_covers_0_to_total_with_no_gaps_or_overlaps() {
		let total = 2_500_000u64;
		let chunk_size = 1_048_576u64; // 1 MiB
		let chunks = plan_chunks(total, chunk_size);

		assert_eq!(chunks.first().unwrap().start, 0);
		assert_eq!(chunks.last().unwrap().end, total);
		assert_eq!(chunks.iter().map(|c| c.end - c.start).sum::<u64>(), total);
		for pair in chunks.windows(2) {
			assert_eq!(pair[0].end, pair[1].start, "chunks must be contiguous");
		}
		for c in &chunks {
			assert!(c.end - c.start <= chunk_size);
		}
	}

	#[test]
	fn single_chunk_when_under_limit() {
		let chunks = plan_chunks(500, 1_048_576);
		assert_eq!(chunks.len(), 1);
		assert_eq!(chunks[0].header_value(), "0-499/500");
	}

	#[test]
	fn never_sends_a_single_post_over_the_limit() {
		let chunks = plan_chunks(3_000_000, 1_048_576);
		assert!(chunks.len() > 1);
		for c in &chunks {
			assert!(c.end - c.start <= 1_048_576);
		}
	}
}

// vim: ts=4
