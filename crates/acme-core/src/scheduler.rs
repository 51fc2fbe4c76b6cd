//! Periodic renewal scheduler.
//!
//! A single recurring sweep, not a generic task-registry engine: every
//! `interval`, ask Inventory which certs are expiring within
//! `renew_within_days` and drive each through `renew_certificate`. Errors on
//! one cert are logged and never abort the sweep for the others.

use std::time::Duration;

use crate::app::App;
use crate::coordinator::IssuanceCoordinator;
use crate::prelude::*;

pub const DEFAULT_INTERVAL_SECS: u64 = 12 * 3600;
pub const DEFAULT_RENEW_WITHIN_DAYS: u32 = 30;

/// Spawn the renewal sweep as a background task. The returned handle is not
/// expected to be joined during normal operation; it runs for the lifetime
/// of the process.
pub fn spawn(app: App, interval: Duration, renew_within_days: u32) -> tokio::task::JoinHandle<()> {
	tokio::spawn(async move {
		let mut ticker = tokio::time::interval(interval);
		loop {
			ticker.tick().await;
			if let Err(e) = sweep(&app.coordinator, renew_within_days).await {
				warn!("renewal sweep failed to list candidates: {e}");
			}
		}
	})
}

async fn sweep(coordinator: &IssuanceCoordinator, renew_within_days: u32) -> ClResult<()> {
	let candidates = coordinator
		.inventory
		.search(SearchQuery {
			domain: None,
			tag: None,
			expiring_within_days: Some(renew_within_days),
		})
		.await?;

	info!(count = candidates.len(), "renewal sweep found expiring certificates");

	for record in candidates {
		if !matches!(record.status, CertStatus::Issued | CertStatus::Deployed) {
			continue;
		}
		match coordinator.renew_certificate(record.cert_id, None, Vec::new(), None).await {
			Ok(_) => info!(cert_id = %record.cert_id, "renewed certificate via scheduled sweep"),
			Err(e) => warn!(cert_id = %record.cert_id, "scheduled renewal failed: {e}"),
		}
	}

	Ok(())
}

// vim: ts=4
