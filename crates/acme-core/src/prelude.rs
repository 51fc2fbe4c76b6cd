pub use acme_types::prelude::*;

// vim: ts=4
