//! Hand-written fakes and a fake `acme.sh`/`openssl` pair, for exercising
//! the Issuance Coordinator without a real ACME client or network access.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;

use acme_types::inventory_adapter::InventoryAdapter;
use acme_types::lb_adapter::LbAdapter;
use acme_types::prelude::*;
use acme_types::record::CreateTenantCertData;
use acme_types::secret_adapter::SecretStoreAdapter;

/// Writes a fake `acme.sh` and `openssl` into a fresh temp directory. Callers
/// keep the returned `FakeAcmeBin` alive for the duration of the test and
/// point `IssuanceCoordinator::acme_bin`/`openssl_bin` at `acme_sh_path()`/
/// `openssl_path()` directly, so no process-global state is ever touched.
pub struct FakeAcmeBin {
	dir: tempfile::TempDir,
}

fn write_executable(path: &PathBuf, body: &str) {
	let mut f = std::fs::File::create(path).expect("create fake executable");
	f.write_all(body.as_bytes()).expect("write fake executable");
	let mut perms = f.metadata().expect("metadata").permissions();
	perms.set_mode(0o755);
	std::fs::set_permissions(path, perms).expect("chmod fake executable");
}

impl FakeAcmeBin {
	pub fn install() -> Self {
		let dir = tempfile::tempdir().expect("tempdir for fake binaries");

		write_executable(&dir.path().join("acme.sh"), ACME_SH_SCRIPT);
		write_executable(&dir.path().join("openssl"), OPENSSL_SCRIPT);

		FakeAcmeBin { dir }
	}

	pub fn acme_sh_path(&self) -> String {
		self.dir.path().join("acme.sh").to_string_lossy().to_string()
	}

	pub fn openssl_path(&self) -> String {
		self.dir.path().join("openssl").to_string_lossy().to_string()
	}
}

/// Reads `--home` out of `$@`, then `$HOME/fake_mode` (default `success`) to
/// decide what to print/exit with. On `success` (the default, and on retry
/// after `--force` under `reused_skip`) it also writes `cert.pem`,
/// `fullchain.pem` and `privkey.pem` into the parent of every `-w` argument,
/// mirroring where the coordinator expects the ACME client to have written
/// them.
const ACME_SH_SCRIPT: &str = r#"#!/bin/sh
home=""
webroots=""
force=0
prev=""
for arg in "$@"; do
	case "$prev" in
		--home) home="$arg" ;;
		-w) webroots="$webroots $arg" ;;
	esac
	if [ "$arg" = "--force" ]; then force=1; fi
	prev="$arg"
done

mode="success"
if [ -f "$home/fake_mode" ]; then
	mode=$(cat "$home/fake_mode")
fi

case "$mode" in
	rate_limited)
		echo "acme:error:rateLimited too many certificates already issued" 1>&2
		echo "retry after 2099-01-01 00:00:00 UTC" 1>&2
		exit 1
		;;
	eab_required)
		echo "externalAccountRequired" 1>&2
		exit 1
		;;
	not_managed)
		echo "test.example is not an issued domain" 1>&2
		exit 1
		;;
	reused_skip)
		if [ "$force" = "1" ]; then
			:
		else
			echo "Skipping. Next renewal time is: 2099-01-01"
			exit 0
		fi
		;;
	revoke_ok)
		exit 0
		;;
esac

# Optional: "$home/fake_tokens" holds one "token:keyAuthorization" pair per
# line. When present, write each into the first webroot's challenge directory
# and pause before finishing, so the Pump has a chance to discover and
# publish them while this process is still running.
if [ -f "$home/fake_tokens" ]; then
	first_wr=$(echo $webroots | awk '{print $1}')
	challenge_dir="$first_wr/.well-known/acme-challenge"
	mkdir -p "$challenge_dir"
	while IFS=: read -r token ka; do
		[ -z "$token" ] && continue
		printf '%s\n' "$ka" > "$challenge_dir/$token"
	done < "$home/fake_tokens"
	sleep 1
fi

for wr in $webroots; do
	wdir=$(dirname "$wr")
	mkdir -p "$wdir"
	printf 'FAKE CERT\n' > "$wdir/cert.pem"
	printf 'FAKE CHAIN\n' > "$wdir/fullchain.pem"
	printf 'FAKE KEY\n' > "$wdir/privkey.pem"
done

echo "Cert success."
exit 0
"#;

/// `openssl x509 -noout -dates -in <path>` always reports the same fixed
/// validity window; `install_and_persist` only cares that it parses.
const OPENSSL_SCRIPT: &str = r#"#!/bin/sh
echo "notBefore=Jan  1 00:00:00 2025 GMT"
echo "notAfter=Jan  1 00:00:00 2026 GMT"
exit 0
"#;

/// In-memory `InventoryAdapter` always keyed around one pre-assigned
/// `cert_id`, with every mutation recorded for assertions.
#[derive(Debug)]
pub struct FakeInventory {
	cert_id: CertId,
	record: Mutex<CertRecord>,
	pub directory_url_updates: Mutex<Vec<String>>,
	pub status_updates: Mutex<Vec<CertStatus>>,
}

impl FakeInventory {
	pub fn seeded(record: CertRecord) -> Self {
		FakeInventory {
			cert_id: record.cert_id,
			record: Mutex::new(record),
			directory_url_updates: Mutex::new(Vec::new()),
			status_updates: Mutex::new(Vec::new()),
		}
	}

	pub fn new(cert_id: CertId, main_domain: &str, directory_url: &str, key_secret_path: &str) -> Self {
		let record = CertRecord {
			cert_id,
			main_domain: main_domain.to_string(),
			san: vec![main_domain.to_string()],
			provider: Provider::LetsEncrypt,
			directory_url: directory_url.to_string(),
			not_before: None,
			not_after: None,
			path: String::new(),
			key_secret_path: key_secret_path.to_string(),
			tags: Vec::new(),
			status: CertStatus::Pending,
			deployed: DeployedInfo::default(),
			created_at: Timestamp::now(),
			updated_at: Timestamp::now(),
		};
		FakeInventory::seeded(record)
	}

	pub fn snapshot(&self) -> CertRecord {
		self.record.lock().expect("lock").clone()
	}
}

#[async_trait]
impl InventoryAdapter for FakeInventory {
	async fn create(&self, data: CreateTenantCertData<'_>) -> ClResult<CertRecord> {
		let mut record = self.record.lock().expect("lock");
		record.main_domain = data.main_domain.to_string();
		record.san = data.san.to_vec();
		record.provider = data.provider;
		record.directory_url = data.directory_url.to_string();
		record.key_secret_path = data.key_secret_path.to_string();
		record.tags = data.tags.to_vec();
		Ok(record.clone())
	}

	async fn get(&self, cert_id: CertId) -> ClResult<CertRecord> {
		if cert_id != self.cert_id {
			return Err(Error::NotFound);
		}
		Ok(self.record.lock().expect("lock").clone())
	}

	async fn update_dates(&self, _cert_id: CertId, not_before: Timestamp, not_after: Timestamp) -> ClResult<()> {
		let mut record = self.record.lock().expect("lock");
		record.not_before = Some(not_before);
		record.not_after = Some(not_after);
		Ok(())
	}

	async fn update_directory_url(&self, _cert_id: CertId, directory_url: &str) -> ClResult<()> {
		self.directory_url_updates.lock().expect("lock").push(directory_url.to_string());
		self.record.lock().expect("lock").directory_url = directory_url.to_string();
		Ok(())
	}

	async fn update_status(&self, _cert_id: CertId, status: CertStatus) -> ClResult<()> {
		self.status_updates.lock().expect("lock").push(status);
		self.record.lock().expect("lock").status = status;
		Ok(())
	}

	async fn store_challenges(&self, _cert_id: CertId, challenges: &[ChallengeRecord]) -> ClResult<()> {
		self.record.lock().expect("lock").deployed.http01_challenges = challenges.to_vec();
		Ok(())
	}

	async fn mark_deployed(
		&self,
		_cert_id: CertId,
		host: &str,
		partition: &str,
		profile: &str,
		sni: Option<&str>,
	) -> ClResult<()> {
		let mut record = self.record.lock().expect("lock");
		record.deployed.bigip = Some(BigipDeployment {
			host: Some(host.to_string()),
			partition: Some(partition.to_string()),
			profile: Some(profile.to_string()),
			sni: sni.map(str::to_string),
		});
		record.status = CertStatus::Deployed;
		Ok(())
	}

	async fn search(&self, _query: SearchQuery) -> ClResult<Vec<CertRecord>> {
		Ok(vec![self.record.lock().expect("lock").clone()])
	}
}

/// In-memory KV-v2-style secret store.
#[derive(Debug, Default)]
pub struct FakeSecretStore {
	data: Mutex<HashMap<String, HashMap<String, String>>>,
}

#[async_trait]
impl SecretStoreAdapter for FakeSecretStore {
	async fn read(&self, path: &str) -> ClResult<HashMap<String, String>> {
		Ok(self.data.lock().expect("lock").get(path).cloned().unwrap_or_default())
	}

	async fn write(&self, path: &str, body: HashMap<String, String>) -> ClResult<()> {
		self.data.lock().expect("lock").insert(path.to_string(), body);
		Ok(())
	}

	async fn delete(&self, path: &str) -> ClResult<()> {
		self.data.lock().expect("lock").remove(path);
		Ok(())
	}
}

/// `LbAdapter` fake recording every call; chunked uploads and installs just
/// echo back a deterministic path rather than talking to a real BIG-IP.
#[derive(Debug, Default)]
pub struct FakeLb {
	pub datagroup_writes: Mutex<Vec<(String, String, BTreeMap<String, String>)>>,
	pub attached_profiles: Mutex<Vec<(String, String)>>,
	pub deployed_virtuals: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl LbAdapter for FakeLb {
	async fn chunked_upload(&self, name: &str, _bytes: &[u8]) -> ClResult<String> {
		Ok(format!("/var/config/rest/downloads/{name}"))
	}

	async fn install_ssl_key(&self, partition: &str, name: &str, _source_path: &str) -> ClResult<String> {
		Ok(format!("/{partition}/{name}"))
	}

	async fn install_ssl_cert(&self, partition: &str, name: &str, _source_path: &str) -> ClResult<String> {
		Ok(format!("/{partition}/{name}"))
	}

	async fn ensure_client_ssl_profile(
		&self,
		partition: &str,
		name: &str,
		_defaults_from: &str,
	) -> ClResult<String> {
		Ok(format!("/{partition}/{name}"))
	}

	async fn attach_key_cert_chain(
		&self,
		profile_fq: &str,
		_key_fq: &str,
		_cert_fq: &str,
		_chain_fq: &str,
	) -> ClResult<()> {
		self.attached_profiles.lock().expect("lock").push(("attach_chain".to_string(), profile_fq.to_string()));
		Ok(())
	}

	async fn attach_profile_to_virtual(&self, vs_fq: &str, profile_fq: &str) -> ClResult<()> {
		self.deployed_virtuals.lock().expect("lock").push((vs_fq.to_string(), profile_fq.to_string()));
		Ok(())
	}

	async fn replace_clientssl_profiles(&self, _vs_fq: &str) -> ClResult<()> {
		Ok(())
	}

	async fn datagroup_upsert(
		&self,
		partition: &str,
		name: &str,
		entries: BTreeMap<String, String>,
	) -> ClResult<()> {
		self.datagroup_writes.lock().expect("lock").push((partition.to_string(), name.to_string(), entries));
		Ok(())
	}

	async fn datagroup_delete(&self, _partition: &str, _name: &str, _tokens: &[String]) -> ClResult<()> {
		Ok(())
	}
}

// vim: ts=4
