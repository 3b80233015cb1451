//! Request authentication.
//!
//! The upstream auth provider terminates the sign-in flow and forwards the signed-in identity in
//! headers. When `security.api_auth_token` is set, the proxy must also present it as a bearer
//! token, otherwise identity headers are trusted as-is.

use axum::{
	extract::FromRequestParts,
	http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use uuid::Uuid;

use crate::{routes::ApiError, state::AppState};
use quill_service::ExternalIdentity;

/// The internal user acting on this request.
#[derive(Clone, Copy, Debug)]
pub struct AuthUser {
	pub id: Uuid,
}

impl FromRequestParts<AppState> for AuthUser {
	type Rejection = ApiError;

	async fn from_request_parts(
		parts: &mut Parts,
		state: &AppState,
	) -> Result<Self, Self::Rejection> {
		let security = &state.service.cfg.security;

		if let Some(expected) = security.api_auth_token.as_deref()
			&& read_bearer_token(&parts.headers) != Some(expected)
		{
			return Err(ApiError::unauthorized());
		}

		let Some(email) = read_header(&parts.headers, &security.identity_header) else {
			return Err(ApiError::unauthorized());
		};
		let name = read_header(&parts.headers, &security.name_header);
		let user = state.service.resolve_identity(ExternalIdentity { email, name }).await?;

		Ok(Self { id: user.id })
	}
}

fn read_bearer_token(headers: &HeaderMap) -> Option<&str> {
	let raw = headers.get(AUTHORIZATION)?;
	let value = raw.to_str().ok()?.trim();
	let token = value.strip_prefix("Bearer ")?.trim();

	if token.is_empty() { None } else { Some(token) }
}

fn read_header(headers: &HeaderMap, name: &str) -> Option<String> {
	let value = headers.get(name)?.to_str().ok()?.trim();

	if value.is_empty() { None } else { Some(value.to_string()) }
}
