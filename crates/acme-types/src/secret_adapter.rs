//! Adapter over a KV-v2-style secret store holding private keys and EAB
//! credentials (component C5).

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;

use crate::error::ClResult;

#[derive(Clone, Debug)]
pub struct EabCredentials {
	pub kid: String,
	pub hmac_key: String,
}

#[async_trait]
pub trait SecretStoreAdapter: Debug + Send + Sync {
	/// Read the inner `.data.data` object at `path`. Missing path returns an
	/// empty mapping, not an error.
	async fn read(&self, path: &str) -> ClResult<HashMap<String, String>>;
	/// Write `body`, wrapped as `{data: body}` on the wire.
	async fn write(&self, path: &str, body: HashMap<String, String>) -> ClResult<()>;
	/// Delete everything stored at `path`. Used on revoke, so the invariant
	/// "exactly one private key lives in the secret store while status !=
	/// revoked" holds after revocation.
	async fn delete(&self, path: &str) -> ClResult<()>;

	async fn read_private_key(&self, path: &str) -> ClResult<Option<String>> {
		Ok(self.read(path).await?.get("private_key_pem").cloned())
	}

	async fn write_private_key(&self, path: &str, private_key_pem: &str) -> ClResult<()> {
		let mut body = HashMap::new();
		body.insert("private_key_pem".to_string(), private_key_pem.to_string());
		self.write(path, body).await
	}

	async fn read_eab(&self, path: &str) -> ClResult<Option<EabCredentials>> {
		let data = self.read(path).await?;
		match (data.get("kid"), data.get("hmac_key")) {
			(Some(kid), Some(hmac_key)) => {
				Ok(Some(EabCredentials { kid: kid.clone(), hmac_key: hmac_key.clone() }))
			}
			_ => Ok(None),
		}
	}
}

/// Normalize a secret-store path to its leaf form.
///
/// Accepts any of `foo/bar`, `/secret/data/foo/bar`, `v1/secret/data/foo/bar`,
/// `/v1/secret/data/foo/bar` and reduces to `foo/bar`. Idempotent:
/// `normalize(normalize(x)) == normalize(x)` for every accepted shape.
pub fn normalize_path(path: &str) -> String {
	let mut p = path.trim_start_matches('/');
	p = p.strip_prefix("v1/").unwrap_or(p);
	p = p.strip_prefix("secret/data/").unwrap_or(p);
	p.to_string()
}


// vim: ts=4
