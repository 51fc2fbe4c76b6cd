//! Issuance Coordinator (C7): the state machine driving C1-C6 through the
//! issue / force-issue / renew / migrate-CA paths.

use acme_types::lb_adapter::LbAdapter;
use acme_types::record::CreateTenantCertData;
use acme_types::secret_adapter::SecretStoreAdapter;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::prelude::*;
use crate::{preflight, pump, runner};
use acme_types::inventory_adapter::InventoryAdapter;

const WAIT_FILES_OR_EXIT_DEADLINE_SECS: u64 = 120;

/// Outcome markers the external ACME client is known to print, kept in one
/// table per the design note against scattering string matches.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Classification {
	LikelySuccess,
	RateLimited { retry_after: Option<Timestamp> },
	EabRequired,
	ReusedSkip,
	NotManaged,
	Unknown,
}

const LIKELY_SUCCESS_MARKERS: &[&str] = &[
	"is already verified, skipping http-01.",
	"Verification finished, beginning signing.",
	"Downloading cert.",
	"Cert success.",
	"Installing cert to:",
	"Your cert is in:",
	"full-chain cert is in:",
];

fn classify(stdout: &str, stderr: &str, renew_path: bool) -> Classification {
	let combined = format!("{stdout}\n{stderr}");

	if combined.contains("acme:error:rateLimited") || combined.contains("too many certificates") {
		let retry_after = parse_retry_after(&combined);
		return Classification::RateLimited { retry_after };
	}
	if combined.contains("externalAccountRequired") {
		return Classification::EabRequired;
	}
	if renew_path && combined.contains("is not an issued domain") {
		return Classification::NotManaged;
	}
	if combined.contains("Skipping. Next renewal time is:") || combined.contains("Domains not changed.")
	{
		return Classification::ReusedSkip;
	}
	if LIKELY_SUCCESS_MARKERS.iter().any(|m| combined.contains(m)) {
		return Classification::LikelySuccess;
	}
	Classification::Unknown
}

fn parse_retry_after(text: &str) -> Option<Timestamp> {
	let idx = text.find("retry after ")?;
	let rest = &text[idx + "retry after ".len()..];
	// "YYYY-MM-DD HH:MM:SS UTC" is exactly 23 bytes.
	let candidate = rest.get(..23)?;
	Timestamp::from_acme_retry_after(candidate)
}

/// Input to `request_certificate`, already validated by the REST layer.
pub struct RequestCertificateInput {
	pub main_domain: String,
	pub san: Vec<String>,
	pub provider: Provider,
	pub directory_url: String,
	pub key_type: KeyType,
	pub contact_emails: Vec<String>,
	pub eab: Option<acme_types::secret_adapter::EabCredentials>,
	pub tags: Vec<String>,
	pub key_secret_path: String,
	/// Must match the statically configured LB host if present; the
	/// Coordinator owns a single `LbAdapter` per process and cannot redirect
	/// a single issuance to a different appliance.
	pub bigip_host: Option<String>,
	/// Overrides the coordinator-wide default partition for this issuance's
	/// Challenge Pump publishes.
	pub bigip_partition: String,
	/// Accepted for wire compatibility with the documented request body;
	/// takes effect only through a later `deploy_certificate` call, which
	/// carries its own `clientssl_profile`/`sni_name` fields. Not consumed
	/// here because issuance never touches client-ssl profiles.
	pub clientssl_profile: Option<String>,
	pub sni_name: Option<String>,
}

/// `POST /acme/get_certificate_bundle` response payload.
pub struct CertificateBundle {
	pub cert_pem: String,
	pub chain_pem: String,
	pub not_before: Option<Timestamp>,
	pub not_after: Option<Timestamp>,
	pub san: Vec<String>,
	pub private_key_pem: Option<String>,
}

/// Input to `POST /bigip/deploy_certificate`.
pub struct DeployCertificateInput {
	pub cert_id: CertId,
	pub partition: String,
	pub clientssl_profile: Option<String>,
	pub clientssl_defaults_from: String,
	pub sni_name: Option<String>,
	pub vs_name: Option<String>,
	pub replace_existing_clientssl: bool,
}

pub struct IssuanceCoordinator {
	pub inventory: Arc<dyn InventoryAdapter>,
	pub secrets: Arc<dyn SecretStoreAdapter>,
	pub lb: Arc<dyn LbAdapter>,
	pub work_root: PathBuf,
	pub acme_home: PathBuf,
	/// Bare name (resolved against `PATH`) or absolute path of the ACME
	/// client binary. Overridable so deployments can pin a vendored copy.
	pub acme_bin: String,
	/// Bare name or absolute path of the `openssl` binary used to read
	/// certificate validity dates.
	pub openssl_bin: String,
	pub bigip_host: String,
	pub bigip_partition: String,
	pub bigip_datagroup: String,
}

struct RunResult {
	outcome: runner::RunOutcome,
}

impl IssuanceCoordinator {
	fn work_dir(&self, cert_id: CertId) -> PathBuf {
		self.work_root.join(cert_id.to_string())
	}

	fn webroot(&self, cert_id: CertId) -> PathBuf {
		self.work_dir(cert_id).join("webroot")
	}

	/// `POST /acme/request_certificate`.
	pub async fn request_certificate(&self, input: RequestCertificateInput) -> ClResult<CertRecord> {
		if let Some(host) = &input.bigip_host {
			if host != &self.bigip_host {
				return Err(Error::ValidationError(format!(
					"this orchestrator manages a single BIG-IP host ({}); bigip_host {host} is not it",
					self.bigip_host
				)));
			}
		}
		if input.clientssl_profile.is_some() || input.sni_name.is_some() {
			debug!(
				clientssl_profile = input.clientssl_profile.as_deref(),
				sni_name = input.sni_name.as_deref(),
				"clientssl_profile/sni_name accepted on request_certificate, deferred to deploy_certificate"
			);
		}

		let record = self
			.inventory
			.create(CreateTenantCertData {
				main_domain: &input.main_domain,
				san: &input.san,
				provider: input.provider,
				directory_url: &input.directory_url,
				path: "",
				key_secret_path: &input.key_secret_path,
				tags: &input.tags,
			})
			.await?;

		tokio::fs::create_dir_all(self.webroot(record.cert_id)).await.map_err(Error::Io)?;

		if let Some(eab) = &input.eab {
			let mut body = std::collections::HashMap::new();
			body.insert("kid".to_string(), eab.kid.clone());
			body.insert("hmac_key".to_string(), eab.hmac_key.clone());
			self.secrets.write(&format!("{}/eab", input.key_secret_path), body).await?;
		}

		let argv = self.build_argv(&record, &input.san, input.key_type, &input.contact_emails, false, input.eab.as_ref());
		self.run_state_machine(record.cert_id, argv, &input.san, false, &input.bigip_partition).await
	}

	/// `POST /acme/renew_certificate`.
	pub async fn renew_certificate(
		&self,
		cert_id: CertId,
		directory_url: Option<String>,
		contact_emails: Vec<String>,
		eab: Option<acme_types::secret_adapter::EabCredentials>,
	) -> ClResult<CertRecord> {
		let record = self.inventory.get(cert_id).await?;

		// migrate-CA: caller's directory_url differs from the stored one.
		let migrate = match &directory_url {
			Some(new_url) if *new_url != record.directory_url => Some(new_url.clone()),
			_ => None,
		};

		let argv = match &migrate {
			Some(new_url) => self.migrate_argv(&record, new_url, &contact_emails, eab.as_ref()),
			None => self.renew_argv(&record),
		};

		let updated = self.run_state_machine(cert_id, argv, &record.san, true, &self.bigip_partition).await?;

		if let Some(new_url) = migrate {
			self.inventory.update_directory_url(cert_id, &new_url).await?;
		}

		Ok(updated)
	}

	/// `POST /acme/finalize_order`. The original source sleeps up to
	/// `wait_seconds` (capped at 120) then returns the record unchanged;
	/// kept as documented behavior per the open design question.
	pub async fn finalize_order(&self, cert_id: CertId, wait_seconds: u64) -> ClResult<CertRecord> {
		tokio::time::sleep(Duration::from_secs(wait_seconds.min(120))).await;
		self.inventory.get(cert_id).await
	}

	/// `POST /acme/list_certificates`.
	pub async fn list_certificates(&self, query: SearchQuery) -> ClResult<Vec<CertRecord>> {
		self.inventory.search(query).await
	}

	/// `POST /acme/get_certificate_bundle`. `cert.pem`/`fullchain.pem` stay on
	/// disk for the cert's lifetime (only `privkey.pem` is transient), so the
	/// bundle is read straight from the working directory; the private key,
	/// if exported, comes from the secret store.
	pub async fn get_certificate_bundle(
		&self,
		cert_id: CertId,
		export_private_key: bool,
	) -> ClResult<CertificateBundle> {
		let record = self.inventory.get(cert_id).await?;
		let wdir = self.work_dir(cert_id);

		let cert_pem = tokio::fs::read_to_string(wdir.join("cert.pem")).await.map_err(Error::Io)?;
		let chain_pem = tokio::fs::read_to_string(wdir.join("fullchain.pem")).await.map_err(Error::Io)?;

		let private_key_pem = if export_private_key {
			self.secrets.read_private_key(&record.key_secret_path).await?
		} else {
			None
		};

		Ok(CertificateBundle {
			cert_pem,
			chain_pem,
			not_before: record.not_before,
			not_after: record.not_after,
			san: record.san,
			private_key_pem,
		})
	}

	/// `POST /acme/revoke_certificate`. Runs the ACME client's revoke
	/// subcommand, then deletes the private key from the secret store so
	/// exactly one private key lives in the secret store while the status
	/// is not revoked.
	pub async fn revoke_certificate(&self, cert_id: CertId) -> ClResult<CertRecord> {
		let record = self.inventory.get(cert_id).await?;
		let argv = vec![
			"--revoke".to_string(),
			"-d".to_string(),
			record.main_domain.clone(),
			"--home".to_string(),
			self.acme_home.to_string_lossy().to_string(),
		];
		let handle = runner::start(&self.acme_bin, &self.acme_home, &argv)?;
		let outcome = handle.finish().await?;
		if outcome.rc != 0 {
			return Err(Error::AcmeUnknownFailure { stdout: outcome.stdout, stderr: outcome.stderr });
		}

		self.secrets.delete(&record.key_secret_path).await?;
		self.inventory.update_status(cert_id, CertStatus::Revoked).await?;
		self.inventory.get(cert_id).await
	}

	/// `POST /bigip/publish_http01_challenges`. A manual, out-of-band
	/// publish of whatever challenge files currently sit in the cert's
	/// webroot — e.g. to re-seed the datagroup after an LB failover, without
	/// running a fresh ACME order. Mirrors one poll iteration of the
	/// Challenge Pump but runs to completion rather than on a loop.
	pub async fn publish_http01_challenges(&self, cert_id: CertId) -> ClResult<Vec<ChallengeRecord>> {
		let challenge_dir = self.webroot(cert_id).join(".well-known").join("acme-challenge");
		let mut batch = std::collections::BTreeMap::new();

		match tokio::fs::read_dir(&challenge_dir).await {
			Ok(mut entries) => {
				while let Ok(Some(entry)) = entries.next_entry().await {
					if !entry.file_type().await.map(|t| t.is_file()).unwrap_or(false) {
						continue;
					}
					let Some(token) = entry.file_name().to_str().map(str::to_string) else { continue };
					if let Ok(content) = tokio::fs::read_to_string(entry.path()).await {
						batch.insert(token, content.trim().to_string());
					}
				}
			}
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
			Err(e) => return Err(Error::Io(e)),
		}

		if batch.is_empty() {
			return Ok(Vec::new());
		}

		self.lb.datagroup_upsert(&self.bigip_partition, &self.bigip_datagroup, batch.clone()).await?;

		let challenges: Vec<ChallengeRecord> = batch
			.into_iter()
			.map(|(token, key_authorization)| ChallengeRecord { token, key_authorization })
			.collect();
		self.inventory.store_challenges(cert_id, &challenges).await?;
		Ok(challenges)
	}

	/// `POST /bigip/deploy_certificate`. Uploads key/cert/chain, installs
	/// each, ensures the client-ssl profile, attaches the chain, and
	/// optionally attaches the profile to a Virtual Server.
	pub async fn deploy_certificate(&self, input: DeployCertificateInput) -> ClResult<CertRecord> {
		let record = self.inventory.get(input.cert_id).await?;
		let wdir = self.work_dir(input.cert_id);

		let cert_pem = tokio::fs::read_to_string(wdir.join("cert.pem")).await.map_err(Error::Io)?;
		let chain_pem = tokio::fs::read_to_string(wdir.join("fullchain.pem")).await.map_err(Error::Io)?;
		let key_pem = self
			.secrets
			.read_private_key(&record.key_secret_path)
			.await?
			.ok_or_else(|| Error::SecretStoreError("private key missing at key_secret_path".into()))?;

		let namesafe = record.main_domain.replace('*', "wildcard").replace('.', "_");
		let cert_id_str = input.cert_id.to_string();
		let base = format!("{namesafe}_{}", &cert_id_str[..8]);

		let key_source = self.lb.chunked_upload(&format!("{base}.key"), key_pem.as_bytes()).await?;
		let cert_source = self.lb.chunked_upload(&format!("{base}.crt"), cert_pem.as_bytes()).await?;
		let chain_source = self.lb.chunked_upload(&format!("{base}_chain.crt"), chain_pem.as_bytes()).await?;

		let key_fq = self.lb.install_ssl_key(&input.partition, &format!("{base}.key"), &key_source).await?;
		let cert_fq = self.lb.install_ssl_cert(&input.partition, &format!("{base}.crt"), &cert_source).await?;
		let chain_fq =
			self.lb.install_ssl_cert(&input.partition, &format!("{base}_chain.crt"), &chain_source).await?;

		let profile_name = input.clientssl_profile.unwrap_or_else(|| format!("clientssl_{namesafe}"));
		let profile_fq = self
			.lb
			.ensure_client_ssl_profile(&input.partition, &profile_name, &input.clientssl_defaults_from)
			.await?;
		self.lb.attach_key_cert_chain(&profile_fq, &key_fq, &cert_fq, &chain_fq).await?;

		if let Some(vs_name) = &input.vs_name {
			let vs_fq = format!("/{}/{}", input.partition, vs_name);
			if input.replace_existing_clientssl {
				self.lb.replace_clientssl_profiles(&vs_fq).await?;
			}
			self.lb.attach_profile_to_virtual(&vs_fq, &profile_fq).await?;
		}

		self.inventory
			.mark_deployed(input.cert_id, &self.bigip_host, &input.partition, &profile_name, input.sni_name.as_deref())
			.await?;
		self.inventory.get(input.cert_id).await
	}

	fn build_argv(
		&self,
		record: &CertRecord,
		san: &[String],
		key_type: KeyType,
		contact_emails: &[String],
		_migrate: bool,
		eab: Option<&acme_types::secret_adapter::EabCredentials>,
	) -> Vec<String> {
		let mut argv = vec!["--issue".to_string()];
		let webroot = self.webroot(record.cert_id).to_string_lossy().to_string();
		for domain in san {
			argv.push("-d".to_string());
			argv.push(domain.clone());
			argv.push("-w".to_string());
			argv.push(webroot.clone());
		}
		argv.push("--server".to_string());
		argv.push(record.directory_url.clone());
		argv.push("--keylength".to_string());
		argv.push(key_type.acme_cli_arg().to_string());
		for email in contact_emails {
			argv.push("--accountemail".to_string());
			argv.push(email.clone());
		}
		if let Some(eab) = eab {
			argv.push("--eab-kid".to_string());
			argv.push(eab.kid.clone());
			argv.push("--eab-hmac-key".to_string());
			argv.push(eab.hmac_key.clone());
		}
		argv.push("--home".to_string());
		argv.push(self.acme_home.to_string_lossy().to_string());
		argv.push("--debug".to_string());
		argv.push("2".to_string());
		argv
	}

	fn migrate_argv(
		&self,
		record: &CertRecord,
		new_directory_url: &str,
		contact_emails: &[String],
		eab: Option<&acme_types::secret_adapter::EabCredentials>,
	) -> Vec<String> {
		let mut argv = self.build_argv(record, &record.san, KeyType::Ec256, contact_emails, true, eab);
		// build_argv already emits --issue and --server <old url>; replace the
		// server argument with the new directory.
		if let Some(pos) = argv.iter().position(|a| a == "--server") {
			argv[pos + 1] = new_directory_url.to_string();
		}
		argv
	}

	fn renew_argv(&self, record: &CertRecord) -> Vec<String> {
		vec![
			"--renew".to_string(),
			"-d".to_string(),
			record.main_domain.clone(),
			"--home".to_string(),
			self.acme_home.to_string_lossy().to_string(),
		]
	}

	/// Drives one `issue()` call through `INIT -> ... -> DONE`, including at
	/// most one FORCE_ISSUE retry.
	async fn run_state_machine(
		&self,
		cert_id: CertId,
		mut argv: Vec<String>,
		san: &[String],
		renew_path: bool,
		bigip_partition: &str,
	) -> ClResult<CertRecord> {
		let mut forced_once = false;
		loop {
			let result = self.run_once(cert_id, &argv, san, bigip_partition).await?;
			let classification = classify(&result.outcome.stdout, &result.outcome.stderr, renew_path);

			match classification {
				Classification::LikelySuccess if result.outcome.rc == 0 => {
					return self.install_and_persist(cert_id).await;
				}
				Classification::RateLimited { retry_after } => {
					let directory_url = self.inventory.get(cert_id).await?.directory_url;
					return Err(Error::AcmeRateLimited { retry_after, directory_url });
				}
				Classification::EabRequired => {
					let directory_url = self.inventory.get(cert_id).await?.directory_url;
					return Err(Error::AcmeEabRequired { directory_url });
				}
				Classification::NotManaged => return Err(Error::AcmeNotManaged),
				Classification::ReusedSkip if !forced_once => {
					forced_once = true;
					argv.push("--force".to_string());
					continue;
				}
				Classification::ReusedSkip => {
					return Err(Error::AcmeUnknownFailure {
						stdout: result.outcome.stdout,
						stderr: result.outcome.stderr,
					});
				}
				_ if result.outcome.rc == 0 => {
					return self.install_and_persist(cert_id).await;
				}
				_ => {
					return Err(Error::AcmeUnknownFailure {
						stdout: result.outcome.stdout,
						stderr: result.outcome.stderr,
					});
				}
			}
		}
	}

	/// Starts the Pump and the Runner concurrently, waits for "files appeared
	/// OR process exited", runs Preflight against every observed token before
	/// letting the Runner finish.
	async fn run_once(
		&self,
		cert_id: CertId,
		argv: &[String],
		san: &[String],
		bigip_partition: &str,
	) -> ClResult<RunResult> {
		let webroot = self.webroot(cert_id);
		tokio::fs::create_dir_all(&webroot).await.map_err(Error::Io)?;

		let pump_deadline = runner::deadline_in(pump::DEFAULT_DEADLINE_SECS);
		let pump_handle = pump::spawn(pump::PumpConfig {
			webroot: webroot.clone(),
			lb: self.lb.clone(),
			partition: bigip_partition.to_string(),
			datagroup: self.bigip_datagroup.clone(),
			deadline: pump_deadline,
			poll_interval: Duration::from_millis(pump::DEFAULT_POLL_INTERVAL_MS),
		});
		// The Pump is deliberately not joined here: it keeps publishing any
		// further tokens (e.g. other SANs) up to its own deadline, detached
		// from this call's lifetime, per the no-shared-`seen`/no-explicit-
		// cancellation design.
		let mut published_rx = pump_handle.published;

		let mut runner_handle = runner::start(&self.acme_bin, &self.acme_home, argv)?;
		let wait_deadline = Instant::now() + Duration::from_secs(WAIT_FILES_OR_EXIT_DEADLINE_SECS);

		// One challenge file is expected per SAN entry; preflight every token
		// the Pump publishes, not just the first, before letting the Runner
		// finish.
		let mut preflighted: HashSet<String> = HashSet::new();

		let outcome = loop {
			if preflighted.len() >= san.len() {
				break None;
			}
			tokio::select! {
				biased;
				token = published_rx.recv() => {
					match token {
						Some(token) => {
							if preflighted.insert(token.clone()) {
								self.preflight_token(&token, &webroot, san).await?;
							}
						}
						None => break None,
					}
				}
				exited = runner_handle.wait_or_exit(wait_deadline) => {
					match exited? {
						Some(outcome) => {
							// Drain whatever the Pump already queued before the
							// process exited so none of it is silently skipped.
							while let Ok(token) = published_rx.try_recv() {
								if preflighted.insert(token.clone()) {
									self.preflight_token(&token, &webroot, san).await?;
								}
							}
							break Some(outcome);
						}
						None => {
							if Instant::now() >= wait_deadline {
								return Err(Error::PreflightTimeout {
									stdout: String::new(),
									stderr: "no challenge files observed before the overall deadline"
										.to_string(),
								});
							}
						}
					}
				}
			}
		};

		let outcome = match outcome {
			Some(outcome) => outcome,
			None => runner_handle.finish().await?,
		};

		Ok(RunResult { outcome })
	}

	async fn preflight_token(&self, token: &str, webroot: &PathBuf, san: &[String]) -> ClResult<()> {
		let token_path = webroot.join(".well-known").join("acme-challenge").join(token);
		let expected = tokio::fs::read_to_string(&token_path).await.map_err(Error::Io)?;
		let expected = expected.trim();
		let hostname = san.first().ok_or_else(|| Error::ValidationError("empty san".into()))?;
		preflight::wait(
			hostname,
			token,
			expected,
			Duration::from_secs(preflight::DEFAULT_TIMEOUT_SECS),
			Duration::from_millis(preflight::DEFAULT_INTERVAL_MS),
		)
		.await
	}

	/// INSTALL + PERSIST: normalize outputs, write the private key to the
	/// secret store, parse dates, and mark the cert issued. The private key
	/// write is authoritative: a failure here must not leave Inventory
	/// marked issued.
	async fn install_and_persist(&self, cert_id: CertId) -> ClResult<CertRecord> {
		let record = self.inventory.get(cert_id).await?;
		let wdir = self.work_dir(cert_id);

		let privkey_path = wdir.join("privkey.pem");
		let cert_path = wdir.join("cert.pem");

		let private_key_pem = tokio::fs::read_to_string(&privkey_path).await.map_err(Error::Io)?;
		self.secrets.write_private_key(&record.key_secret_path, &private_key_pem).await?;
		let _ = tokio::fs::remove_file(&privkey_path).await;

		let (not_before, not_after) = self.parse_cert_dates(&cert_path).await?;
		self.inventory.update_dates(cert_id, not_before, not_after).await?;
		self.inventory.update_status(cert_id, CertStatus::Issued).await?;

		self.inventory.get(cert_id).await
	}

	/// Parses notBefore/notAfter out of `cert.pem` via an external date-parser
	/// invocation (`openssl x509 -noout -dates`), keeping X.509 parsing out
	/// of this process per the non-goals.
	async fn parse_cert_dates(&self, cert_path: &PathBuf) -> ClResult<(Timestamp, Timestamp)> {
			let output = tokio::process::Command::new(&self.openssl_bin)
			.args(["x509", "-noout", "-dates", "-in"])
			.arg(cert_path)
			.output()
			.await
			.map_err(Error::Io)?;
		let text = String::from_utf8_lossy(&output.stdout);

		let mut not_before = None;
		let mut not_after = None;
		for line in text.lines() {
			if let Some(v) = line.strip_prefix("notBefore=") {
				not_before = Timestamp::from_openssl_date(v.trim());
			}
			if let Some(v) = line.strip_prefix("notAfter=") {
				not_after = Timestamp::from_openssl_date(v.trim());
			}
		}

		match (not_before, not_after) {
			(Some(nb), Some(na)) => Ok((nb, na)),
			_ => Err(Error::Internal("could not parse certificate dates".into())),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn classifies_rate_limited_with_retry_after() {
		let stderr = "acme:error:rateLimited too many certificates already issued\nretry after 2025-01-02 03:04:05 UTC\n";
		match classify("", stderr, false) {
			Classification::RateLimited { retry_after: Some(ts) } => {
				assert_eq!(ts.to_rfc3339(), "2025-01-02T03:04:05Z");
			}
			other => panic!("unexpected classification: {other:?}"),
		}
	}

	#[test]
	fn classifies_eab_required() {
		assert_eq!(classify("", "externalAccountRequired", false), Classification::EabRequired);
	}

	#[test]
	fn classifies_reused_skip() {
		assert_eq!(
			classify("Skipping. Next renewal time is: 2030-01-01", "", false),
			Classification::ReusedSkip
		);
		assert_eq!(classify("Domains not changed.", "", false), Classification::ReusedSkip);
	}

	#[test]
	fn classifies_not_managed_only_on_renew_path() {
		assert_eq!(classify("", "X is not an issued domain", true), Classification::NotManaged);
		assert_eq!(classify("", "X is not an issued domain", false), Classification::Unknown);
	}

	#[test]
	fn classifies_likely_success_markers() {
		assert_eq!(classify("Cert success.\n", "", false), Classification::LikelySuccess);
		assert_eq!(classify("Your cert is in: /x/cert.pem\n", "", false), Classification::LikelySuccess);
	}

	#[test]
	fn unknown_failure_falls_through() {
		assert_eq!(classify("", "some unrelated stderr noise", false), Classification::Unknown);
	}
}

// vim: ts=4
