//! sqlx error translation helpers.

use acme_types::prelude::*;
use tracing::error;

pub fn inspect(err: &sqlx::Error) {
	error!("sqlite error: {}", err);
}

/// Translate a raw `sqlx::Error` into the crate's own `Error`, logging anything
/// that isn't an expected "no such row" outcome.
pub fn sqlx_err(e: sqlx::Error) -> Error {
	match e {
		sqlx::Error::RowNotFound => Error::NotFound,
		other => {
			inspect(&other);
			Error::InventoryError(other.to_string())
		}
	}
}

// vim: ts=4
