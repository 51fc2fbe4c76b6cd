//! Error handling subsystem. Implements the orchestrator's custom `Error` type.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::prelude::*;

pub type ClResult<T> = std::result::Result<T, Error>;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
	pub reason: String,
	pub message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub retry_after: Option<Timestamp>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub directory_url: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub fields_needed: Option<Vec<String>>,
}

#[derive(Debug)]
pub enum Error {
	// Core errors
	NotFound,
	Conflict(String),

	// Input validation
	ValidationError(String), // 400 - invalid domain, missing required field, etc.

	// ACME-specific outcomes
	AcmeRateLimited { retry_after: Option<Timestamp>, directory_url: String },
	AcmeEabRequired { directory_url: String },
	AcmeNotManaged,
	AcmeUnknownFailure { stdout: String, stderr: String },
	PreflightTimeout { stdout: String, stderr: String },

	// Collaborator errors
	LbApiError(String),
	SecretStoreError(String),
	InventoryError(String),

	// System and configuration
	ConfigError(String),
	ServiceUnavailable(String),
	Internal(String),

	// externals
	Io(std::io::Error),
}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		warn!("io error: {}", err);
		Self::Io(err)
	}
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "{:?}", self)
	}
}

impl std::error::Error for Error {}

impl IntoResponse for Error {
	fn into_response(self) -> axum::response::Response {
		let (status, body) = match self {
			Error::NotFound => (
				StatusCode::NOT_FOUND,
				ErrorResponse {
					reason: "not_found".into(),
					message: "Certificate record not found".into(),
					retry_after: None,
					directory_url: None,
					fields_needed: None,
				},
			),
			Error::Conflict(msg) => (
				StatusCode::CONFLICT,
				ErrorResponse {
					reason: "conflict".into(),
					message: msg,
					retry_after: None,
					directory_url: None,
					fields_needed: None,
				},
			),
			Error::ValidationError(msg) => (
				StatusCode::BAD_REQUEST,
				ErrorResponse {
					reason: "validation_error".into(),
					message: msg,
					retry_after: None,
					directory_url: None,
					fields_needed: None,
				},
			),
			Error::AcmeRateLimited { retry_after, directory_url } => (
				StatusCode::TOO_MANY_REQUESTS,
				ErrorResponse {
					reason: "acme_rate_limited".into(),
					message: "The ACME provider is rate limiting this account".into(),
					retry_after,
					directory_url: Some(directory_url),
					fields_needed: None,
				},
			),
			Error::AcmeEabRequired { directory_url } => (
				StatusCode::BAD_REQUEST,
				ErrorResponse {
					reason: "acme_eab_required".into(),
					message: "This ACME provider requires External Account Binding".into(),
					retry_after: None,
					directory_url: Some(directory_url),
					fields_needed: Some(vec!["eab_secret".into()]),
				},
			),
			Error::AcmeNotManaged => (
				StatusCode::BAD_REQUEST,
				ErrorResponse {
					reason: "ACME_NOT_MANAGED".into(),
					message: "This domain is not an issued domain known to the ACME account".into(),
					retry_after: None,
					directory_url: None,
					fields_needed: None,
				},
			),
			Error::AcmeUnknownFailure { stdout, stderr } => {
				warn!("acme unknown failure: stdout={} stderr={}", stdout, stderr);
				(
					StatusCode::BAD_GATEWAY,
					ErrorResponse {
						reason: "acme_unknown_failure".into(),
						message: format!("ACME client failed: {stderr}"),
						retry_after: None,
						directory_url: None,
						fields_needed: None,
					},
				)
			}
			Error::PreflightTimeout { stdout, stderr } => {
				warn!("preflight timeout: stdout={} stderr={}", stdout, stderr);
				(
					StatusCode::GATEWAY_TIMEOUT,
					ErrorResponse {
						reason: "preflight_timeout".into(),
						message: "Load balancer did not serve the expected challenge body in time"
							.into(),
						retry_after: None,
						directory_url: None,
						fields_needed: None,
					},
				)
			}
			Error::LbApiError(msg) => {
				warn!("lb api error: {}", msg);
				(
					StatusCode::BAD_GATEWAY,
					ErrorResponse {
						reason: "lb_api_error".into(),
						message: "Load balancer management API request failed".into(),
						retry_after: None,
						directory_url: None,
						fields_needed: None,
					},
				)
			}
			Error::SecretStoreError(msg) => {
				warn!("secret store error: {}", msg);
				(
					StatusCode::BAD_GATEWAY,
					ErrorResponse {
						reason: "secret_store_error".into(),
						message: "Secret store request failed".into(),
						retry_after: None,
						directory_url: None,
						fields_needed: None,
					},
				)
			}
			Error::InventoryError(msg) => {
				warn!("inventory error: {}", msg);
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					ErrorResponse {
						reason: "inventory_error".into(),
						message: "Internal server error".into(),
						retry_after: None,
						directory_url: None,
						fields_needed: None,
					},
				)
			}
			Error::ConfigError(msg) => {
				warn!("config error: {}", msg);
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					ErrorResponse {
						reason: "config_error".into(),
						message: "Internal server error".into(),
						retry_after: None,
						directory_url: None,
						fields_needed: None,
					},
				)
			}
			Error::ServiceUnavailable(msg) => (
				StatusCode::SERVICE_UNAVAILABLE,
				ErrorResponse {
					reason: "service_unavailable".into(),
					message: msg,
					retry_after: None,
					directory_url: None,
					fields_needed: None,
				},
			),
			Error::Internal(msg) => {
				warn!("internal error: {}", msg);
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					ErrorResponse {
						reason: "internal_error".into(),
						message: "Internal server error".into(),
						retry_after: None,
						directory_url: None,
						fields_needed: None,
					},
				)
			}
			Error::Io(_) => (
				StatusCode::INTERNAL_SERVER_ERROR,
				ErrorResponse {
					reason: "io_error".into(),
					message: "Internal server error".into(),
					retry_after: None,
					directory_url: None,
					fields_needed: None,
				},
			),
		};

		(status, Json(body)).into_response()
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		warn!("json error: {}", err);
		Error::Internal("json (de)serialization error".into())
	}
}

impl From<tokio::task::JoinError> for Error {
	fn from(err: tokio::task::JoinError) -> Self {
		warn!("tokio join error: {}", err);
		Error::ServiceUnavailable("task execution failed".into())
	}
}

impl From<axum::http::Error> for Error {
	fn from(err: axum::http::Error) -> Self {
		warn!("http error: {}", err);
		Error::Internal("http error".into())
	}
}

/// Helper macro for locking mutexes/rwlocks with automatic internal error handling.
#[macro_export]
macro_rules! lock {
	($mutex:expr) => {
		$mutex.lock().map_err(|_| $crate::error::Error::Internal("mutex poisoned".into()))
	};
	($mutex:expr, $context:expr) => {
		$mutex
			.lock()
			.map_err(|_| $crate::error::Error::Internal(format!("mutex poisoned: {}", $context)))
	};
}

// vim: ts=4
