pub use acme_core::app::App;
pub use acme_types::prelude::*;

// vim: ts=4
