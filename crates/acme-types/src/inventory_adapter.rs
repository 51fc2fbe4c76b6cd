//! Adapter that persists certificate records, challenge history, and
//! deployment pointers (component C6).

use async_trait::async_trait;
use std::fmt::Debug;

use crate::prelude::*;
use crate::record::CreateTenantCertData;

#[async_trait]
pub trait InventoryAdapter: Debug + Send + Sync {
	async fn create(&self, data: CreateTenantCertData<'_>) -> ClResult<CertRecord>;
	async fn get(&self, cert_id: CertId) -> ClResult<CertRecord>;
	async fn update_dates(&self, cert_id: CertId, not_before: Timestamp, not_after: Timestamp) -> ClResult<()>;
	async fn update_directory_url(&self, cert_id: CertId, directory_url: &str) -> ClResult<()>;
	async fn update_status(&self, cert_id: CertId, status: CertStatus) -> ClResult<()>;
	/// Merge challenge records into the `deployed.http01_challenges` sub-document.
	async fn store_challenges(&self, cert_id: CertId, challenges: &[ChallengeRecord]) -> ClResult<()>;
	async fn mark_deployed(
		&self,
		cert_id: CertId,
		host: &str,
		partition: &str,
		profile: &str,
		sni: Option<&str>,
	) -> ClResult<()>;
	async fn search(&self, query: SearchQuery) -> ClResult<Vec<CertRecord>>;
}

// vim: ts=4
