//! Request/response DTOs for the `/acme/*` routes. Field names and shapes
//! are preserved verbatim since they are the product surface.

use serde::{Deserialize, Serialize};

use acme_types::prelude::*;
use acme_types::secret_adapter::EabCredentials;

fn default_bigip_partition() -> String {
	"/Common".to_string()
}

fn default_challenge_type() -> String {
	"HTTP-01".to_string()
}

#[derive(Debug, Deserialize)]
pub struct EabSecretDto {
	pub kid: String,
	pub hmac_key: String,
}

impl From<EabSecretDto> for EabCredentials {
	fn from(dto: EabSecretDto) -> Self {
		EabCredentials { kid: dto.kid, hmac_key: dto.hmac_key }
	}
}

#[derive(Debug, Deserialize)]
pub struct RequestCertificateRequest {
	pub domains: Vec<String>,
	pub provider: Provider,
	pub directory_url: Option<String>,
	pub eab_secret: Option<EabSecretDto>,
	#[serde(default = "default_challenge_type")]
	pub challenge_type: String,
	#[serde(default)]
	pub contact_emails: Vec<String>,
	pub key_type: Option<KeyType>,
	#[serde(default)]
	pub tags: Vec<String>,
	pub bigip_host: Option<String>,
	#[serde(default = "default_bigip_partition")]
	pub bigip_partition: String,
	pub clientssl_profile: Option<String>,
	pub sni_name: Option<String>,
	pub key_secret_path: String,
}

#[derive(Debug, Serialize)]
pub struct Http01File {
	pub path: String,
	#[serde(rename = "keyAuthorization")]
	pub key_authorization: String,
}

#[derive(Debug, Serialize)]
pub struct ChallengeInfo {
	#[serde(rename = "type")]
	pub challenge_type: String,
	pub http01_files: Vec<Http01File>,
}

#[derive(Debug, Serialize)]
pub struct CertificateResponse {
	pub cert_id: CertId,
	pub status: CertStatus,
	pub not_before: Option<Timestamp>,
	pub not_after: Option<Timestamp>,
	pub san: Vec<String>,
	pub provider: Provider,
	pub directory_url: String,
	pub challenge: ChallengeInfo,
}

impl From<CertRecord> for CertificateResponse {
	fn from(record: CertRecord) -> Self {
		let http01_files = record
			.deployed
			.http01_challenges
			.iter()
			.map(|c| Http01File {
				path: format!("/.well-known/acme-challenge/{}", c.token),
				key_authorization: c.key_authorization.clone(),
			})
			.collect();
		CertificateResponse {
			cert_id: record.cert_id,
			status: record.status,
			not_before: record.not_before,
			not_after: record.not_after,
			san: record.san,
			provider: record.provider,
			directory_url: record.directory_url,
			challenge: ChallengeInfo { challenge_type: "HTTP-01".to_string(), http01_files },
		}
	}
}

#[derive(Debug, Deserialize)]
pub struct RenewCertificateRequest {
	pub cert_id: CertId,
	pub directory_url: Option<String>,
	pub provider: Option<Provider>,
	#[serde(default)]
	pub contact_emails: Vec<String>,
	pub eab_secret: Option<EabSecretDto>,
}

#[derive(Debug, Deserialize)]
pub struct GetCertificateBundleRequest {
	pub cert_id: CertId,
	#[serde(default)]
	pub export_private_key: bool,
}

#[derive(Debug, Serialize)]
pub struct CertificateBundleResponse {
	pub cert_pem: String,
	pub chain_pem: String,
	pub not_before: Option<Timestamp>,
	pub not_after: Option<Timestamp>,
	pub san: Vec<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub private_key_pem: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RevokeCertificateRequest {
	pub cert_id: CertId,
}

#[derive(Debug, Deserialize, Default)]
pub struct ListCertificatesRequest {
	pub domain: Option<String>,
	pub tag: Option<String>,
	pub expiring_within_days: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ListCertificatesResponse {
	pub certificates: Vec<CertificateResponse>,
}

#[derive(Debug, Deserialize)]
pub struct FinalizeOrderRequest {
	pub cert_id: CertId,
	#[serde(default)]
	pub wait_seconds: u64,
}

// vim: ts=4
