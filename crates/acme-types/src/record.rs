//! Certificate record and related domain types.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use uuid::Uuid;

use crate::timestamp::Timestamp;

pub type CertId = Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
	LetsEncrypt,
	Google,
	ZeroSsl,
	Sectigo,
	Digicert,
	Custom,
}

impl Provider {
	/// Built-in directory shortcuts. `None` for providers that require
	/// a caller-supplied `directory_url`.
	pub fn directory_url(&self) -> Option<&'static str> {
		match self {
			Provider::LetsEncrypt => Some("https://acme-v02.api.letsencrypt.org/directory"),
			Provider::Google => Some("https://dv.acme-v02.api.pki.goog/directory"),
			Provider::ZeroSsl => Some("https://acme.zerossl.com/v2/DV90"),
			Provider::Sectigo | Provider::Digicert | Provider::Custom => None,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeyType {
	#[serde(rename = "EC256")]
	Ec256,
	#[serde(rename = "EC384")]
	Ec384,
	#[serde(rename = "RSA2048")]
	Rsa2048,
	#[serde(rename = "RSA3072")]
	Rsa3072,
	#[serde(rename = "RSA4096")]
	Rsa4096,
}

impl KeyType {
	/// The `--keylength` value the ACME CLI expects.
	pub fn acme_cli_arg(&self) -> &'static str {
		match self {
			KeyType::Ec256 => "ec-256",
			KeyType::Ec384 => "ec-384",
			KeyType::Rsa2048 => "2048",
			KeyType::Rsa3072 => "3072",
			KeyType::Rsa4096 => "4096",
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CertStatus {
	Pending,
	Issued,
	Revoked,
	Deployed,
	Error,
}

/// A (token, keyAuthorization) pair written by the ACME client into the
/// webroot and published to the LB datagroup.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ChallengeRecord {
	pub token: String,
	#[serde(rename = "keyAuthorization")]
	pub key_authorization: String,
}

#[skip_serializing_none]
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct BigipDeployment {
	pub host: Option<String>,
	pub partition: Option<String>,
	pub profile: Option<String>,
	pub sni: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct DeployedInfo {
	#[serde(default)]
	pub http01_challenges: Vec<ChallengeRecord>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub bigip: Option<BigipDeployment>,
}

/// The persistent Certificate Record.
///
/// Invariants enforced by the `InventoryAdapter` implementation, not by this
/// struct alone: (i) `san` non-empty; (ii) if `status` is `Issued`/`Deployed`,
/// `not_before <= not_after` and both set; (iii) exactly one private key
/// lives at `key_secret_path` while `status != Revoked`.
#[skip_serializing_none]
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CertRecord {
	pub cert_id: CertId,
	pub main_domain: String,
	pub san: Vec<String>,
	pub provider: Provider,
	pub directory_url: String,
	pub not_before: Option<Timestamp>,
	pub not_after: Option<Timestamp>,
	/// Local working directory holding cert.pem, fullchain.pem, webroot/.
	pub path: String,
	/// Logical path in the secret store, never a filesystem path.
	pub key_secret_path: String,
	pub tags: Vec<String>,
	pub status: CertStatus,
	pub deployed: DeployedInfo,
	pub created_at: Timestamp,
	pub updated_at: Timestamp,
}

impl CertRecord {
	pub fn validate(&self) -> Result<(), String> {
		if self.san.is_empty() {
			return Err("san must be non-empty".into());
		}
		if self.san.first().map(String::as_str) != Some(self.main_domain.as_str()) {
			return Err("san[0] must equal main_domain".into());
		}
		if matches!(self.status, CertStatus::Issued | CertStatus::Deployed) {
			match (self.not_before, self.not_after) {
				(Some(nb), Some(na)) if nb <= na => {}
				_ => return Err("issued/deployed records require not_before <= not_after".into()),
			}
		}
		Ok(())
	}
}

/// Query parameters for `InventoryAdapter::search`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SearchQuery {
	pub domain: Option<String>,
	pub tag: Option<String>,
	pub expiring_within_days: Option<u32>,
}

#[derive(Clone, Debug)]
pub struct CreateTenantCertData<'a> {
	pub main_domain: &'a str,
	pub san: &'a [String],
	pub provider: Provider,
	pub directory_url: &'a str,
	pub path: &'a str,
	pub key_secret_path: &'a str,
	pub tags: &'a [String],
}

// vim: ts=4
