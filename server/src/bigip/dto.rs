//! Request/response DTOs for the `/bigip/*` routes.

use serde::{Deserialize, Serialize};

use acme_types::prelude::*;

fn default_partition() -> String {
	"Common".to_string()
}

fn default_clientssl_defaults_from() -> String {
	"clientssl".to_string()
}

#[derive(Debug, Deserialize)]
pub struct PublishHttp01ChallengesRequest {
	pub cert_id: CertId,
}

#[derive(Debug, Serialize)]
pub struct PublishHttp01ChallengesResponse {
	pub challenges: Vec<ChallengeRecord>,
}

#[derive(Debug, Deserialize)]
pub struct DeployCertificateRequest {
	pub cert_id: CertId,
	#[serde(default = "default_partition")]
	pub partition: String,
	pub clientssl_profile: Option<String>,
	#[serde(default = "default_clientssl_defaults_from")]
	pub clientssl_defaults_from: String,
	pub sni_name: Option<String>,
	pub vs_name: Option<String>,
	#[serde(default)]
	pub replace_existing_clientssl: bool,
}

#[derive(Debug, Serialize)]
pub struct DeployCertificateResponse {
	pub cert_id: CertId,
	pub status: CertStatus,
	pub bigip: Option<BigipDeployment>,
}

impl From<CertRecord> for DeployCertificateResponse {
	fn from(record: CertRecord) -> Self {
		DeployCertificateResponse { cert_id: record.cert_id, status: record.status, bigip: record.deployed.bigip }
	}
}

// vim: ts=4
