//! Input validation for the `/acme/*` REST surface.

use regex::Regex;

use acme_types::prelude::{ClResult, Error, Provider};
use acme_types::secret_adapter::EabCredentials;

fn domain_regex() -> ClResult<Regex> {
	Regex::new(r"^[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
		.map_err(|e| Error::Internal(format!("domain regex compilation failed: {e}")))
}

pub fn validate_domain(domain: &str) -> ClResult<()> {
	if !domain_regex()?.is_match(domain) {
		return Err(Error::ValidationError(format!("invalid domain: {domain}")));
	}
	Ok(())
}

/// `san[0]` becomes `main_domain`; every entry must pass the domain regex
/// and none may be a wildcard (HTTP-01 cannot validate wildcards).
pub fn validate_san(san: &[String]) -> ClResult<()> {
	if san.is_empty() {
		return Err(Error::ValidationError("domains must not be empty".into()));
	}
	for domain in san {
		if domain.starts_with("*.") {
			return Err(Error::ValidationError(format!(
				"wildcard domain {domain} cannot be validated via HTTP-01"
			)));
		}
		validate_domain(domain)?;
	}
	Ok(())
}

/// Resolve the effective directory URL: an explicit `directory_url` always
/// wins; otherwise fall back to the provider's built-in shortcut.
/// Providers without a shortcut (sectigo, digicert, custom) require one.
pub fn resolve_directory_url(provider: Provider, directory_url: Option<&str>) -> ClResult<String> {
	if let Some(explicit) = directory_url.filter(|u| !u.is_empty()) {
		return Ok(explicit.to_string());
	}
	provider.directory_url().map(str::to_string).ok_or_else(|| {
		Error::ValidationError(format!("{provider:?} requires a caller-supplied directory_url"))
	})
}

pub fn validate_eab(eab: &EabCredentials) -> ClResult<()> {
	if eab.kid.is_empty() || eab.hmac_key.is_empty() {
		return Err(Error::ValidationError("eab_secret requires both kid and hmac_key".into()));
	}
	Ok(())
}

pub fn validate_key_secret_path(path: &str) -> ClResult<()> {
	if path.is_empty() {
		return Err(Error::ValidationError("key_secret_path is required".into()));
	}
	Ok(())
}


// vim: ts=4
