use std::sync::Arc;

use acme_core::app::{Adapters, Builder};
use acme_core::config::Config;
use acme_core::prelude::*;
use acme_core::scheduler;
use acme_inventory_sqlite::SqliteInventoryAdapter;
use acme_lb_bigip::BigipAdapter;
use acme_secret_vault::VaultAdapter;

#[tokio::main]
async fn main() -> ClResult<()> {
	tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_target(false)
		.init();

	let config = Config::from_env()?;

	let bigip_host = config
		.bigip_host
		.clone()
		.ok_or_else(|| Error::ConfigError("BIGIP_HOST not set".into()))?;
	let verify_tls = std::env::var("BIGIP_VERIFY_TLS").ok().as_deref() != Some("false");

	let inventory = Arc::new(SqliteInventoryAdapter::new(&config.db_dsn).await?);
	let secrets =
		Arc::new(VaultAdapter::new(&config.vault_addr, &config.vault_token, config.vault_cacert.as_deref())?);
	let lb = Arc::new(BigipAdapter::new(&bigip_host, &config.bigip_user, &config.bigip_pass, verify_tls)?);

	let app = Builder::new(config, Adapters { inventory, secrets, lb }).build()?;

	let _scheduler = scheduler::spawn(
		app.clone(),
		std::time::Duration::from_secs(scheduler::DEFAULT_INTERVAL_SECS),
		scheduler::DEFAULT_RENEW_WITHIN_DAYS,
	);

	let listen = std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8443".to_string());
	let router = acme_orchestrator_server::routes::init(app);

	let listener = tokio::net::TcpListener::bind(&listen).await.map_err(Error::Io)?;
	info!("Listening on {}", listen);
	axum::serve(listener, router).await.map_err(Error::Io)?;

	Ok(())
}

// vim: ts=4
