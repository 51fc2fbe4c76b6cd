//! Challenge Pump (C2): watches the webroot challenge directory and
//! publishes newly-written (token, keyAuthorization) pairs to the LB
//! datagroup while the ACME client is still running.
//!
//! Runs as a `tokio::spawn`ed task bounded by its own deadline rather than
//! a detached daemon, so the coordinator can observe both progress (via
//! `published`) and completion (via `join`).

use acme_types::lb_adapter::LbAdapter;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};

use crate::prelude::*;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;
pub const DEFAULT_DEADLINE_SECS: u64 = 120;

/// Seed parameters for one Pump run. A fresh `seen` set is created per
/// issuance; it is never shared across issuances.
pub struct PumpConfig {
	pub webroot: PathBuf,
	pub lb: Arc<dyn LbAdapter>,
	pub partition: String,
	pub datagroup: String,
	pub deadline: Instant,
	pub poll_interval: Duration,
}

/// Handle to a running Pump task.
pub struct PumpHandle {
	/// Fires once per newly-published token, for the coordinator to race
	/// against the ACME process exiting.
	pub published: mpsc::UnboundedReceiver<String>,
	join: JoinHandle<ClResult<HashSet<String>>>,
}

impl PumpHandle {
	/// Await the task to completion (deadline elapsed), returning every
	/// token name it ever published.
	pub async fn join(self) -> ClResult<HashSet<String>> {
		self.join.await.map_err(Error::from)?
	}
}

/// Spawn the Pump as a background task.
pub fn spawn(cfg: PumpConfig) -> PumpHandle {
	let (tx, rx) = mpsc::unbounded_channel();
	let join = tokio::spawn(run(cfg, tx));
	PumpHandle { published: rx, join }
}

async fn run(cfg: PumpConfig, tx: mpsc::UnboundedSender<String>) -> ClResult<HashSet<String>> {
	let mut seen: HashSet<String> = HashSet::new();
	let challenge_dir = cfg.webroot.join(".well-known").join("acme-challenge");

	while Instant::now() < cfg.deadline {
		match tokio::fs::read_dir(&challenge_dir).await {
			Ok(mut entries) => {
				let mut batch = BTreeMap::new();
				while let Ok(Some(entry)) = entries.next_entry().await {
					if !entry.file_type().await.map(|t| t.is_file()).unwrap_or(false) {
						continue;
					}
					let Some(token) = entry.file_name().to_str().map(str::to_string) else { continue };
					if seen.contains(&token) {
						continue;
					}
					if let Ok(content) = tokio::fs::read_to_string(entry.path()).await {
						batch.insert(token, content.trim().to_string());
					}
				}
				if !batch.is_empty() {
					debug!(count = batch.len(), "publishing challenge batch to LB datagroup");
					cfg.lb.datagroup_upsert(&cfg.partition, &cfg.datagroup, batch.clone()).await?;
					for token in batch.into_keys() {
						seen.insert(token.clone());
						let _ = tx.send(token);
					}
				}
			}
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				// webroot not created yet by the ACME client; keep polling
			}
			Err(e) => return Err(Error::Io(e)),
		}

		sleep(cfg.poll_interval.min(cfg.deadline.saturating_duration_since(Instant::now()))).await;
	}

	Ok(seen)
}

// vim: ts=4
