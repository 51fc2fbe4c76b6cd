//! Axum handlers for the `/bigip/*` resource area.

use axum::extract::State;
use axum::Json;

use acme_core::coordinator::DeployCertificateInput;
use acme_core::prelude::*;

use crate::bigip::dto::*;
use crate::prelude::*;

pub async fn publish_http01_challenges(
	State(app): State<App>,
	Json(req): Json<PublishHttp01ChallengesRequest>,
) -> ClResult<Json<PublishHttp01ChallengesResponse>> {
	let challenges = app.coordinator.publish_http01_challenges(req.cert_id).await?;
	Ok(Json(PublishHttp01ChallengesResponse { challenges }))
}

pub async fn deploy_certificate(
	State(app): State<App>,
	Json(req): Json<DeployCertificateRequest>,
) -> ClResult<Json<DeployCertificateResponse>> {
	let input = DeployCertificateInput {
		cert_id: req.cert_id,
		partition: req.partition,
		clientssl_profile: req.clientssl_profile,
		clientssl_defaults_from: req.clientssl_defaults_from,
		sni_name: req.sni_name,
		vs_name: req.vs_name,
		replace_existing_clientssl: req.replace_existing_clientssl,
	};
	let record = app.coordinator.deploy_certificate(input).await?;
	Ok(Json(record.into()))
}

// vim: ts=4
