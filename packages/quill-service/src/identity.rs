//! Maps the identity asserted by the upstream auth provider to an internal user.

use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, QuillService, Result, UserResponse};
use quill_storage::models::UserRecord;

#[derive(Clone, Debug)]
pub struct ExternalIdentity {
	pub email: String,
	pub name: Option<String>,
}

impl QuillService {
	/// Returns the user registered under this email, creating it on first sight.
	///
	/// Concurrent first sign-ins race on the unique email; the loser re-reads the winner's row,
	/// so every caller observes the same id.
	pub async fn resolve_identity(&self, identity: ExternalIdentity) -> Result<UserResponse> {
		let email = identity.email.trim();

		if email.is_empty() {
			return Err(Error::Unauthorized { message: "Unauthorized".to_string() });
		}
		if let Some(user) = self.store.find_user_by_email(email).await? {
			return Ok(user.into());
		}

		let user = UserRecord {
			id: Uuid::new_v4(),
			email: email.to_string(),
			full_name: identity
				.name
				.map(|name| name.trim().to_string())
				.filter(|name| !name.is_empty()),
			created_at: OffsetDateTime::now_utc(),
		};

		match self.store.insert_user(&user).await {
			Ok(()) => {
				tracing::info!(user_id = %user.id, "User registered.");

				Ok(user.into())
			},
			Err(quill_storage::Error::Conflict(_)) => {
				let Some(existing) = self.store.find_user_by_email(email).await? else {
					return Err(Error::Internal {
						message: "User conflicted but could not be re-read.".to_string(),
					});
				};

				Ok(existing.into())
			},
			Err(err) => Err(err.into()),
		}
	}
}
