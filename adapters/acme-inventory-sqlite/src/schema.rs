//! Schema bootstrap: a single `cert_records` table, JSON sub-documents in TEXT columns.

use acme_types::prelude::*;
use sqlx::SqlitePool;

pub async fn init_db(pool: &SqlitePool) -> ClResult<()> {
	let mut tx = pool
		.begin()
		.await
		.map_err(|e| Error::InventoryError(format!("begin tx: {e}")))?;

	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS cert_records (
			cert_id TEXT PRIMARY KEY,
			main_domain TEXT NOT NULL,
			san TEXT NOT NULL,
			provider TEXT NOT NULL,
			directory_url TEXT NOT NULL,
			not_before TEXT,
			not_after TEXT,
			path TEXT NOT NULL,
			key_secret_path TEXT NOT NULL,
			tags TEXT NOT NULL,
			status TEXT NOT NULL,
			deployed TEXT NOT NULL,
			created_at TEXT NOT NULL,
			updated_at TEXT NOT NULL
		)
		"#,
	)
	.execute(&mut *tx)
	.await
	.map_err(|e| Error::InventoryError(format!("create table: {e}")))?;

	sqlx::query("CREATE INDEX IF NOT EXISTS idx_cert_records_domain ON cert_records(main_domain)")
		.execute(&mut *tx)
		.await
		.map_err(|e| Error::InventoryError(format!("create index: {e}")))?;

	sqlx::query("CREATE INDEX IF NOT EXISTS idx_cert_records_not_after ON cert_records(not_after)")
		.execute(&mut *tx)
		.await
		.map_err(|e| Error::InventoryError(format!("create index: {e}")))?;

	tx.commit()
		.await
		.map_err(|e| Error::InventoryError(format!("commit tx: {e}")))?;
	Ok(())
}

// vim: ts=4
