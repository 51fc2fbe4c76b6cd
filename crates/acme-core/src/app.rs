//! Application state type, built via `Builder` with adapters injected as
//! trait objects.

use acme_types::inventory_adapter::InventoryAdapter;
use acme_types::lb_adapter::LbAdapter;
use acme_types::secret_adapter::SecretStoreAdapter;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::coordinator::IssuanceCoordinator;
use crate::prelude::*;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fixed working-directory root for `<root>/<cert_id>` scratch directories.
/// Independent of `Config::acme_home`, which is the ACME client's own home
/// directory and may point anywhere an operator's `ACME_HOME` sets it to.
const WORK_ROOT: &str = "/work";

pub struct AppState {
	pub config: Config,
	pub coordinator: IssuanceCoordinator,
	pub inventory: Arc<dyn InventoryAdapter>,
	pub secrets: Arc<dyn SecretStoreAdapter>,
	pub lb: Arc<dyn LbAdapter>,
}

pub type App = Arc<AppState>;

/// Adapter set the caller must supply; every field is required since the
/// core has exactly one implementation of each role.
pub struct Adapters {
	pub inventory: Arc<dyn InventoryAdapter>,
	pub secrets: Arc<dyn SecretStoreAdapter>,
	pub lb: Arc<dyn LbAdapter>,
}

pub struct Builder {
	config: Config,
	adapters: Adapters,
	bigip_partition: String,
	bigip_datagroup: String,
}

impl Builder {
	pub fn new(config: Config, adapters: Adapters) -> Self {
		Builder {
			config,
			adapters,
			bigip_partition: "Common".to_string(),
			bigip_datagroup: "acme_http01_challenges".to_string(),
		}
	}

	pub fn bigip_partition(mut self, partition: impl Into<String>) -> Self {
		self.bigip_partition = partition.into();
		self
	}

	pub fn bigip_datagroup(mut self, datagroup: impl Into<String>) -> Self {
		self.bigip_datagroup = datagroup.into();
		self
	}

	pub fn build(self) -> ClResult<App> {
		let work_root: PathBuf = PathBuf::from(WORK_ROOT);
		let bigip_host = self.config.bigip_host.clone().unwrap_or_default();
		let coordinator = IssuanceCoordinator {
			inventory: self.adapters.inventory.clone(),
			secrets: self.adapters.secrets.clone(),
			lb: self.adapters.lb.clone(),
			work_root,
			acme_home: self.config.acme_home.clone(),
			acme_bin: self.config.acme_bin.clone(),
			openssl_bin: self.config.openssl_bin.clone(),
			bigip_host,
			bigip_partition: self.bigip_partition,
			bigip_datagroup: self.bigip_datagroup,
		};

		Ok(Arc::new(AppState {
			config: self.config,
			coordinator,
			inventory: self.adapters.inventory,
			secrets: self.adapters.secrets,
			lb: self.adapters.lb,
		}))
	}
}

// vim: ts=4
