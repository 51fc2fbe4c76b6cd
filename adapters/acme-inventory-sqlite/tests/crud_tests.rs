//! Inventory adapter CRUD operation tests.

use acme_inventory_sqlite::SqliteInventoryAdapter;
use acme_types::inventory_adapter::InventoryAdapter;
use acme_types::record::{CertStatus, ChallengeRecord, CreateTenantCertData, Provider, SearchQuery};
use acme_types::timestamp::Timestamp;
use tempfile::TempDir;

async fn create_test_adapter() -> (SqliteInventoryAdapter, TempDir) {
	let temp_dir = TempDir::new().expect("failed to create temp directory");
	let dsn = format!("sqlite://{}/test.db", temp_dir.path().display());
	let adapter = SqliteInventoryAdapter::new(&dsn).await.expect("failed to create adapter");
	(adapter, temp_dir)
}

fn test_data<'a>(main_domain: &'a str, san: &'a [String], tags: &'a [String]) -> CreateTenantCertData<'a> {
	CreateTenantCertData {
		main_domain,
		san,
		provider: Provider::LetsEncrypt,
		directory_url: "https://acme-v02.api.letsencrypt.org/directory",
		path: "/work/some-id",
		key_secret_path: "tls/a.example.com",
		tags,
	}
}

#[tokio::test]
async fn create_and_read_cert_record() {
	let (adapter, _temp) = create_test_adapter().await;
	let san = vec!["a.example.com".to_string()];
	let tags = vec!["prod".to_string()];

	let created = adapter.create(test_data("a.example.com", &san, &tags)).await.expect("should create record");
	assert_eq!(created.main_domain, "a.example.com");
	assert_eq!(created.status, CertStatus::Pending);

	let fetched = adapter.get(created.cert_id).await.expect("should read record back");
	assert_eq!(fetched.cert_id, created.cert_id);
	assert_eq!(fetched.san, san);
	assert_eq!(fetched.tags, tags);
}

#[tokio::test]
async fn create_rejects_san_not_headed_by_main_domain() {
	let (adapter, _temp) = create_test_adapter().await;
	let san = vec!["b.example.com".to_string()];
	let tags = vec![];

	let result = adapter.create(test_data("a.example.com", &san, &tags)).await;
	assert!(result.is_err(), "san[0] != main_domain should be rejected");
}

#[tokio::test]
async fn get_nonexistent_cert_errors() {
	let (adapter, _temp) = create_test_adapter().await;
	let result = adapter.get(uuid::Uuid::new_v4()).await;
	assert!(result.is_err(), "nonexistent cert_id should error");
}

#[tokio::test]
async fn update_dates_persists_validity_window() {
	let (adapter, _temp) = create_test_adapter().await;
	let san = vec!["a.example.com".to_string()];
	let created = adapter.create(test_data("a.example.com", &san, &[])).await.expect("should create record");

	// Whole-second timestamps: the RFC3339 wire format truncates to seconds,
	// so a `Timestamp::now()` round-tripped through storage would not
	// compare equal to the sub-second value held in memory.
	let not_before = Timestamp::from_unix(1_700_000_000);
	let not_after = not_before.add_seconds(90 * 86_400);
	adapter.update_dates(created.cert_id, not_before, not_after).await.expect("should update dates");

	let fetched = adapter.get(created.cert_id).await.expect("should read record back");
	assert_eq!(fetched.not_before, Some(not_before));
	assert_eq!(fetched.not_after, Some(not_after));
}

#[tokio::test]
async fn update_dates_on_missing_record_errors() {
	let (adapter, _temp) = create_test_adapter().await;
	let result = adapter.update_dates(uuid::Uuid::new_v4(), Timestamp::now(), Timestamp::now()).await;
	assert!(result.is_err());
}

#[tokio::test]
async fn update_status_transitions_the_record() {
	let (adapter, _temp) = create_test_adapter().await;
	let san = vec!["a.example.com".to_string()];
	let created = adapter.create(test_data("a.example.com", &san, &[])).await.expect("should create record");

	adapter.update_status(created.cert_id, CertStatus::Issued).await.expect("should update status");
	let fetched = adapter.get(created.cert_id).await.expect("should read record back");
	assert_eq!(fetched.status, CertStatus::Issued);
}

#[tokio::test]
async fn update_directory_url_persists() {
	let (adapter, _temp) = create_test_adapter().await;
	let san = vec!["a.example.com".to_string()];
	let created = adapter.create(test_data("a.example.com", &san, &[])).await.expect("should create record");

	adapter
		.update_directory_url(created.cert_id, "https://acme.zerossl.com/v2/DV90")
		.await
		.expect("should update directory_url");
	let fetched = adapter.get(created.cert_id).await.expect("should read record back");
	assert_eq!(fetched.directory_url, "https://acme.zerossl.com/v2/DV90");
}

#[tokio::test]
async fn store_challenges_appends_then_updates_by_token() {
	let (adapter, _temp) = create_test_adapter().await;
	let san = vec!["a.example.com".to_string()];
	let created = adapter.create(test_data("a.example.com", &san, &[])).await.expect("should create record");

	let first = ChallengeRecord { token: "tok-1".to_string(), key_authorization: "ka-1".to_string() };
	adapter.store_challenges(created.cert_id, std::slice::from_ref(&first)).await.expect("should store challenge");

	let fetched = adapter.get(created.cert_id).await.expect("should read record back");
	assert_eq!(fetched.deployed.http01_challenges.len(), 1);
	assert_eq!(fetched.deployed.http01_challenges[0].key_authorization, "ka-1");

	let updated = ChallengeRecord { token: "tok-1".to_string(), key_authorization: "ka-1-updated".to_string() };
	adapter.store_challenges(created.cert_id, std::slice::from_ref(&updated)).await.expect("should update challenge");

	let fetched = adapter.get(created.cert_id).await.expect("should read record back");
	assert_eq!(fetched.deployed.http01_challenges.len(), 1, "same token must overwrite, not append");
	assert_eq!(fetched.deployed.http01_challenges[0].key_authorization, "ka-1-updated");
}

#[tokio::test]
async fn mark_deployed_records_bigip_placement_and_sets_status() {
	let (adapter, _temp) = create_test_adapter().await;
	let san = vec!["a.example.com".to_string()];
	let created = adapter.create(test_data("a.example.com", &san, &[])).await.expect("should create record");

	adapter
		.mark_deployed(created.cert_id, "bigip1.example.net", "/Common", "clientssl_a_example_com", Some("a.example.com"))
		.await
		.expect("should mark deployed");

	let fetched = adapter.get(created.cert_id).await.expect("should read record back");
	assert_eq!(fetched.status, CertStatus::Deployed);
	let bigip = fetched.deployed.bigip.expect("bigip deployment should be recorded");
	assert_eq!(bigip.host.as_deref(), Some("bigip1.example.net"));
	assert_eq!(bigip.partition.as_deref(), Some("/Common"));
	assert_eq!(bigip.profile.as_deref(), Some("clientssl_a_example_com"));
	assert_eq!(bigip.sni.as_deref(), Some("a.example.com"));
}

#[tokio::test]
async fn search_by_domain_matches_main_domain_and_san() {
	let (adapter, _temp) = create_test_adapter().await;
	adapter
		.create(test_data("a.example.com", &["a.example.com".to_string()], &[]))
		.await
		.expect("should create record");
	let san_match = vec!["b.example.com".to_string(), "alt.example.com".to_string()];
	adapter.create(test_data("b.example.com", &san_match, &[])).await.expect("should create record");
	adapter
		.create(test_data("c.example.com", &["c.example.com".to_string()], &[]))
		.await
		.expect("should create record");

	let by_main = adapter
		.search(SearchQuery { domain: Some("a.example.com".to_string()), tag: None, expiring_within_days: None })
		.await
		.expect("search should succeed");
	assert_eq!(by_main.len(), 1);
	assert_eq!(by_main[0].main_domain, "a.example.com");

	let by_san = adapter
		.search(SearchQuery { domain: Some("alt.example.com".to_string()), tag: None, expiring_within_days: None })
		.await
		.expect("search should succeed");
	assert_eq!(by_san.len(), 1);
	assert_eq!(by_san[0].main_domain, "b.example.com");
}

#[tokio::test]
async fn search_by_tag_filters_records() {
	let (adapter, _temp) = create_test_adapter().await;
	adapter
		.create(test_data("a.example.com", &["a.example.com".to_string()], &["prod".to_string()]))
		.await
		.expect("should create record");
	adapter
		.create(test_data("b.example.com", &["b.example.com".to_string()], &["staging".to_string()]))
		.await
		.expect("should create record");

	let results = adapter
		.search(SearchQuery { domain: None, tag: Some("prod".to_string()), expiring_within_days: None })
		.await
		.expect("search should succeed");
	assert_eq!(results.len(), 1);
	assert_eq!(results[0].main_domain, "a.example.com");
}

#[tokio::test]
async fn search_by_expiring_within_days_excludes_far_future_and_unset_expiry() {
	let (adapter, _temp) = create_test_adapter().await;
	let soon = adapter
		.create(test_data("soon.example.com", &["soon.example.com".to_string()], &[]))
		.await
		.expect("should create record");
	adapter
		.create(test_data("far.example.com", &["far.example.com".to_string()], &[]))
		.await
		.expect("should create record");
	let unset = adapter
		.create(test_data("unset.example.com", &["unset.example.com".to_string()], &[]))
		.await
		.expect("should create record");

	adapter
		.update_dates(soon.cert_id, Timestamp::now(), Timestamp::now().add_seconds(5 * 86_400))
		.await
		.expect("should set soon expiry");
	let far = adapter.get(unset.cert_id).await.expect("should read record back");
	let _ = far;

	let results = adapter
		.search(SearchQuery { domain: None, tag: None, expiring_within_days: Some(30) })
		.await
		.expect("search should succeed");
	assert_eq!(results.len(), 1);
	assert_eq!(results[0].main_domain, "soon.example.com");
}
