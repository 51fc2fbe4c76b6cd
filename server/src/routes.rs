//! API routes: one unauthenticated JSON surface, `/acme/*` and
//! `/bigip/*`, wrapped in request tracing.

use axum::routing::post;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::acme;
use crate::bigip;
use crate::prelude::*;

pub fn init(app: App) -> Router {
	Router::new()
		.route("/acme/request_certificate", post(acme::handler::request_certificate))
		.route("/acme/renew_certificate", post(acme::handler::renew_certificate))
		.route("/acme/finalize_order", post(acme::handler::finalize_order))
		.route("/acme/list_certificates", post(acme::handler::list_certificates))
		.route("/acme/get_certificate_bundle", post(acme::handler::get_certificate_bundle))
		.route("/acme/revoke_certificate", post(acme::handler::revoke_certificate))
		.route("/bigip/publish_http01_challenges", post(bigip::handler::publish_http01_challenges))
		.route("/bigip/deploy_certificate", post(bigip::handler::deploy_certificate))
		.layer(TraceLayer::new_for_http())
		.with_state(app)
}

// vim: ts=4
