//! Axum handlers for the `/acme/*` resource area.

use axum::extract::State;
use axum::Json;

use acme_core::coordinator::{CertificateBundle, RequestCertificateInput};
use acme_core::prelude::*;
use acme_types::secret_adapter::EabCredentials;

use crate::acme::dto::*;
use crate::prelude::*;
use crate::validation;

pub async fn request_certificate(
	State(app): State<App>,
	Json(req): Json<RequestCertificateRequest>,
) -> ClResult<Json<CertificateResponse>> {
	validation::validate_san(&req.domains)?;
	validation::validate_key_secret_path(&req.key_secret_path)?;
	let directory_url = validation::resolve_directory_url(req.provider, req.directory_url.as_deref())?;
	let eab = req.eab_secret.map(EabCredentials::from);
	if let Some(eab) = &eab {
		validation::validate_eab(eab)?;
	}

	let input = RequestCertificateInput {
		main_domain: req.domains[0].clone(),
		san: req.domains,
		provider: req.provider,
		directory_url,
		key_type: req.key_type.unwrap_or(KeyType::Ec256),
		contact_emails: req.contact_emails,
		eab,
		tags: req.tags,
		key_secret_path: req.key_secret_path,
		bigip_host: req.bigip_host,
		bigip_partition: req.bigip_partition,
		clientssl_profile: req.clientssl_profile,
		sni_name: req.sni_name,
	};
	let record = app.coordinator.request_certificate(input).await?;
	Ok(Json(record.into()))
}

pub async fn renew_certificate(
	State(app): State<App>,
	Json(req): Json<RenewCertificateRequest>,
) -> ClResult<Json<CertificateResponse>> {
	let eab = req.eab_secret.map(EabCredentials::from);
	if let Some(eab) = &eab {
		validation::validate_eab(eab)?;
	}
	let record = app
		.coordinator
		.renew_certificate(req.cert_id, req.directory_url, req.contact_emails, eab)
		.await?;
	Ok(Json(record.into()))
}

pub async fn finalize_order(
	State(app): State<App>,
	Json(req): Json<FinalizeOrderRequest>,
) -> ClResult<Json<CertificateResponse>> {
	let record = app.coordinator.finalize_order(req.cert_id, req.wait_seconds).await?;
	Ok(Json(record.into()))
}

pub async fn list_certificates(
	State(app): State<App>,
	Json(req): Json<ListCertificatesRequest>,
) -> ClResult<Json<ListCertificatesResponse>> {
	let query = SearchQuery {
		domain: req.domain,
		tag: req.tag,
		expiring_within_days: req.expiring_within_days,
	};
	let certificates = app.coordinator.list_certificates(query).await?;
	Ok(Json(ListCertificatesResponse { certificates: certificates.into_iter().map(Into::into).collect() }))
}

pub async fn get_certificate_bundle(
	State(app): State<App>,
	Json(req): Json<GetCertificateBundleRequest>,
) -> ClResult<Json<CertificateBundleResponse>> {
	let CertificateBundle { cert_pem, chain_pem, not_before, not_after, san, private_key_pem } =
		app.coordinator.get_certificate_bundle(req.cert_id, req.export_private_key).await?;
	Ok(Json(CertificateBundleResponse { cert_pem, chain_pem, not_before, not_after, san, private_key_pem }))
}

pub async fn revoke_certificate(
	State(app): State<App>,
	Json(req): Json<RevokeCertificateRequest>,
) -> ClResult<Json<CertificateResponse>> {
	let record = app.coordinator.revoke_certificate(req.cert_id).await?;
	Ok(Json(record.into()))
}

// vim: ts=4
