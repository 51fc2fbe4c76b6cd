//! Shared types, adapter traits, and error taxonomy for the cert orchestrator.
//!
//! This crate contains the foundational types shared between the `server`
//! crate and all adapter implementations (`acme-lb-bigip`,
//! `acme-secret-vault`, `acme-inventory-sqlite`). Extracting these into a
//! separate crate lets the adapter crates compile independently of `acme-core`.

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

pub mod error;
pub mod inventory_adapter;
pub mod lb_adapter;
pub mod prelude;
pub mod record;
pub mod secret_adapter;
pub mod timestamp;

// vim: ts=4
