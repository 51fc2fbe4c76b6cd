//! Inventory Adapter (C6): SQLite-backed certificate record store.
//!
//! One row per certificate. Enum fields, the SAN/tag lists, and the
//! `deployed` sub-document ride along as JSON-encoded TEXT columns rather
//! than a normalized schema — the record as a whole is small and is always
//! read or written as a unit.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

mod schema;
mod utils;

use acme_types::inventory_adapter::InventoryAdapter;
use acme_types::prelude::*;
use acme_types::record::CreateTenantCertData;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::str::FromStr;
use uuid::Uuid;

use utils::sqlx_err;

#[derive(Debug)]
pub struct SqliteInventoryAdapter {
	db: SqlitePool,
	dbr: SqlitePool,
}

impl SqliteInventoryAdapter {
	/// `dsn` is an `sqlx` sqlite connection string, e.g. `sqlite://acme.db`.
	pub async fn new(dsn: &str) -> ClResult<Self> {
		let opts = SqliteConnectOptions::from_str(dsn)
			.map_err(|e| Error::ConfigError(format!("invalid db dsn: {e}")))?
			.create_if_missing(true)
			.journal_mode(SqliteJournalMode::Wal);

		let db = SqlitePoolOptions::new()
			.max_connections(1)
			.connect_with(opts.clone())
			.await
			.map_err(|e| Error::ConfigError(format!("db connect failed: {e}")))?;

		schema::init_db(&db).await?;

		let dbr = SqlitePoolOptions::new()
			.max_connections(5)
			.connect_with(opts.read_only(true))
			.await
			.map_err(|e| Error::ConfigError(format!("db connect failed: {e}")))?;

		Ok(SqliteInventoryAdapter { db, dbr })
	}
}

fn row_to_record(row: SqliteRow) -> ClResult<CertRecord> {
	let cert_id: String = row.try_get("cert_id").map_err(|e| Error::InventoryError(e.to_string()))?;
	let san: String = row.try_get("san").map_err(|e| Error::InventoryError(e.to_string()))?;
	let provider: String = row.try_get("provider").map_err(|e| Error::InventoryError(e.to_string()))?;
	let not_before: Option<String> =
		row.try_get("not_before").map_err(|e| Error::InventoryError(e.to_string()))?;
	let not_after: Option<String> =
		row.try_get("not_after").map_err(|e| Error::InventoryError(e.to_string()))?;
	let tags: String = row.try_get("tags").map_err(|e| Error::InventoryError(e.to_string()))?;
	let status: String = row.try_get("status").map_err(|e| Error::InventoryError(e.to_string()))?;
	let deployed: String = row.try_get("deployed").map_err(|e| Error::InventoryError(e.to_string()))?;
	let created_at: String = row.try_get("created_at").map_err(|e| Error::InventoryError(e.to_string()))?;
	let updated_at: String = row.try_get("updated_at").map_err(|e| Error::InventoryError(e.to_string()))?;

	Ok(CertRecord {
		cert_id: Uuid::parse_str(&cert_id).map_err(|e| Error::InventoryError(format!("bad cert_id: {e}")))?,
		main_domain: row.try_get("main_domain").map_err(|e| Error::InventoryError(e.to_string()))?,
		san: serde_json::from_str(&san)?,
		provider: serde_json::from_str(&provider)?,
		directory_url: row.try_get("directory_url").map_err(|e| Error::InventoryError(e.to_string()))?,
		not_before: not_before.map(|s| serde_json::from_str(&s)).transpose()?,
		not_after: not_after.map(|s| serde_json::from_str(&s)).transpose()?,
		path: row.try_get("path").map_err(|e| Error::InventoryError(e.to_string()))?,
		key_secret_path: row.try_get("key_secret_path").map_err(|e| Error::InventoryError(e.to_string()))?,
		tags: serde_json::from_str(&tags)?,
		status: serde_json::from_str(&status)?,
		deployed: serde_json::from_str(&deployed)?,
		created_at: serde_json::from_str(&created_at)?,
		updated_at: serde_json::from_str(&updated_at)?,
	})
}

#[async_trait]
impl InventoryAdapter for SqliteInventoryAdapter {
	async fn create(&self, data: CreateTenantCertData<'_>) -> ClResult<CertRecord> {
		let record = CertRecord {
			cert_id: Uuid::new_v4(),
			main_domain: data.main_domain.to_string(),
			san: data.san.to_vec(),
			provider: data.provider,
			directory_url: data.directory_url.to_string(),
			not_before: None,
			not_after: None,
			path: data.path.to_string(),
			key_secret_path: data.key_secret_path.to_string(),
			tags: data.tags.to_vec(),
			status: CertStatus::Pending,
			deployed: DeployedInfo::default(),
			created_at: Timestamp::now(),
			updated_at: Timestamp::now(),
		};
		record.validate().map_err(Error::ValidationError)?;

		sqlx::query(
			r#"
			INSERT INTO cert_records
				(cert_id, main_domain, san, provider, directory_url, not_before, not_after,
				 path, key_secret_path, tags, status, deployed, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(record.cert_id.to_string())
		.bind(&record.main_domain)
		.bind(serde_json::to_string(&record.san)?)
		.bind(serde_json::to_string(&record.provider)?)
		.bind(&record.directory_url)
		.bind(None::<String>)
		.bind(None::<String>)
		.bind(&record.path)
		.bind(&record.key_secret_path)
		.bind(serde_json::to_string(&record.tags)?)
		.bind(serde_json::to_string(&record.status)?)
		.bind(serde_json::to_string(&record.deployed)?)
		.bind(serde_json::to_string(&record.created_at)?)
		.bind(serde_json::to_string(&record.updated_at)?)
		.execute(&self.db)
		.await
		.map_err(sqlx_err)?;

		Ok(record)
	}

	async fn get(&self, cert_id: CertId) -> ClResult<CertRecord> {
		let row = sqlx::query("SELECT * FROM cert_records WHERE cert_id = ?")
			.bind(cert_id.to_string())
			.fetch_optional(&self.dbr)
			.await
			.map_err(sqlx_err)?
			.ok_or(Error::NotFound)?;
		row_to_record(row)
	}

	async fn update_dates(&self, cert_id: CertId, not_before: Timestamp, not_after: Timestamp) -> ClResult<()> {
		let result = sqlx::query("UPDATE cert_records SET not_before = ?, not_after = ?, updated_at = ? WHERE cert_id = ?")
			.bind(serde_json::to_string(&not_before)?)
			.bind(serde_json::to_string(&not_after)?)
			.bind(serde_json::to_string(&Timestamp::now())?)
			.bind(cert_id.to_string())
			.execute(&self.db)
			.await
			.map_err(sqlx_err)?;
		if result.rows_affected() == 0 {
			return Err(Error::NotFound);
		}
		Ok(())
	}

	async fn update_directory_url(&self, cert_id: CertId, directory_url: &str) -> ClResult<()> {
		let result = sqlx::query("UPDATE cert_records SET directory_url = ?, updated_at = ? WHERE cert_id = ?")
			.bind(directory_url)
			.bind(serde_json::to_string(&Timestamp::now())?)
			.bind(cert_id.to_string())
			.execute(&self.db)
			.await
			.map_err(sqlx_err)?;
		if result.rows_affected() == 0 {
			return Err(Error::NotFound);
		}
		Ok(())
	}

	async fn update_status(&self, cert_id: CertId, status: CertStatus) -> ClResult<()> {
		let result = sqlx::query("UPDATE cert_records SET status = ?, updated_at = ? WHERE cert_id = ?")
			.bind(serde_json::to_string(&status)?)
			.bind(serde_json::to_string(&Timestamp::now())?)
			.bind(cert_id.to_string())
			.execute(&self.db)
			.await
			.map_err(sqlx_err)?;
		if result.rows_affected() == 0 {
			return Err(Error::NotFound);
		}
		Ok(())
	}

	async fn store_challenges(&self, cert_id: CertId, challenges: &[ChallengeRecord]) -> ClResult<()> {
		let mut record = self.get(cert_id).await?;
		for incoming in challenges {
			match record.deployed.http01_challenges.iter_mut().find(|c| c.token == incoming.token) {
				Some(existing) => existing.key_authorization = incoming.key_authorization.clone(),
				None => record.deployed.http01_challenges.push(incoming.clone()),
			}
		}

		let result = sqlx::query("UPDATE cert_records SET deployed = ?, updated_at = ? WHERE cert_id = ?")
			.bind(serde_json::to_string(&record.deployed)?)
			.bind(serde_json::to_string(&Timestamp::now())?)
			.bind(cert_id.to_string())
			.execute(&self.db)
			.await
			.map_err(sqlx_err)?;
		if result.rows_affected() == 0 {
			return Err(Error::NotFound);
		}
		Ok(())
	}

	async fn mark_deployed(
		&self,
		cert_id: CertId,
		host: &str,
		partition: &str,
		profile: &str,
		sni: Option<&str>,
	) -> ClResult<()> {
		let mut record = self.get(cert_id).await?;
		record.deployed.bigip = Some(BigipDeployment {
			host: Some(host.to_string()),
			partition: Some(partition.to_string()),
			profile: Some(profile.to_string()),
			sni: sni.map(str::to_string),
		});

		let result = sqlx::query("UPDATE cert_records SET deployed = ?, status = ?, updated_at = ? WHERE cert_id = ?")
			.bind(serde_json::to_string(&record.deployed)?)
			.bind(serde_json::to_string(&CertStatus::Deployed)?)
			.bind(serde_json::to_string(&Timestamp::now())?)
			.bind(cert_id.to_string())
			.execute(&self.db)
			.await
			.map_err(sqlx_err)?;
		if result.rows_affected() == 0 {
			return Err(Error::NotFound);
		}
		Ok(())
	}

	async fn search(&self, query: SearchQuery) -> ClResult<Vec<CertRecord>> {
		let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM cert_records WHERE 1 = 1");

		if let Some(domain) = &query.domain {
			builder.push(" AND (main_domain = ").push_bind(domain.clone());
			builder.push(" OR san LIKE ").push_bind(format!("%\"{domain}\"%")).push(")");
		}
		if let Some(tag) = &query.tag {
			builder.push(" AND tags LIKE ").push_bind(format!("%\"{tag}\"%"));
		}
		if let Some(days) = query.expiring_within_days {
			// not_after is stored as a JSON-quoted RFC3339 `Z` timestamp; lexicographic
			// order on that representation matches chronological order, so a plain
			// string comparison against the cutoff is sound.
			let cutoff = Timestamp::now().add_seconds(i64::from(days) * 86_400);
			builder.push(" AND not_after IS NOT NULL AND not_after <= ").push_bind(serde_json::to_string(&cutoff)?);
		}
		builder.push(" ORDER BY created_at DESC");

		let rows = builder
			.build()
			.fetch_all(&self.dbr)
			.await
			.map_err(sqlx_err)?;

		rows.into_iter().map(row_to_record).collect()
	}
}

// vim: ts=4
