//! Environment-variable configuration.

use std::path::PathBuf;

use crate::prelude::*;
use acme_types::record::KeyType;

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// `~/.acme.sh`, the ACME client's own default home directory, resolved
/// against `HOME` at startup. Falls back to a relative `.acme.sh` if `HOME`
/// is unset (e.g. a minimal container without a configured user).
fn default_acme_home() -> PathBuf {
	match env_var("HOME") {
		Some(home) => PathBuf::from(home).join(".acme.sh"),
		None => PathBuf::from(".acme.sh"),
	}
}

#[derive(Clone, Debug)]
pub struct Config {
	pub db_dsn: String,
	pub vault_addr: String,
	pub vault_token: String,
	pub vault_cacert: Option<String>,
	pub bigip_host: Option<String>,
	pub bigip_user: String,
	pub bigip_pass: String,
	pub allow_key_export: bool,
	pub default_key_type: KeyType,
	pub acme_home: PathBuf,
	pub acme_debug: bool,
	/// Bare name or absolute path of the ACME client binary, overridable so
	/// deployments can pin a vendored copy instead of relying on `PATH`.
	pub acme_bin: String,
	/// Bare name or absolute path of the `openssl` binary used to read
	/// certificate validity dates.
	pub openssl_bin: String,
}

impl Config {
	/// Load configuration from the process environment. Missing required
	/// variables are reported as `Error::ConfigError`.
	pub fn from_env() -> ClResult<Self> {
		let db_dsn = env_var("DB_DSN").ok_or_else(|| Error::ConfigError("DB_DSN not set".into()))?;
		let vault_addr =
			env_var("VAULT_ADDR").ok_or_else(|| Error::ConfigError("VAULT_ADDR not set".into()))?;
		let vault_token =
			env_var("VAULT_TOKEN").ok_or_else(|| Error::ConfigError("VAULT_TOKEN not set".into()))?;
		let bigip_user =
			env_var("BIGIP_USER").ok_or_else(|| Error::ConfigError("BIGIP_USER not set".into()))?;
		let bigip_pass =
			env_var("BIGIP_PASS").ok_or_else(|| Error::ConfigError("BIGIP_PASS not set".into()))?;

		let default_key_type = match env_var("DEFAULT_KEY_TYPE").as_deref() {
			Some("EC256") | None => KeyType::Ec256,
			Some("EC384") => KeyType::Ec384,
			Some("RSA2048") => KeyType::Rsa2048,
			Some("RSA3072") => KeyType::Rsa3072,
			Some("RSA4096") => KeyType::Rsa4096,
			Some(other) => {
				return Err(Error::ConfigError(format!("invalid DEFAULT_KEY_TYPE: {other}")));
			}
		};

		Ok(Config {
			db_dsn,
			vault_addr,
			vault_token,
			vault_cacert: env_var("VAULT_CACERT"),
			bigip_host: env_var("BIGIP_HOST"),
			bigip_user,
			bigip_pass,
			allow_key_export: env_var("ALLOW_KEY_EXPORT").as_deref() == Some("true"),
			default_key_type,
			acme_home: env_var("ACME_HOME").map(PathBuf::from).unwrap_or_else(default_acme_home),
			acme_debug: env_var("ACME_DEBUG").as_deref() == Some("true"),
			acme_bin: env_var("ACME_SH_PATH").unwrap_or_else(|| "acme.sh".to_string()),
			openssl_bin: env_var("OPENSSL_PATH").unwrap_or_else(|| "openssl".to_string()),
		})
	}
}

// vim: ts=4
