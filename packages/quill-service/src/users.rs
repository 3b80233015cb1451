use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{DeleteResponse, Error, QuillService, Result};
use quill_storage::models::{UserPatch, UserRecord};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
	pub full_name: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserResponse {
	pub id: Uuid,
	pub email: String,
	pub full_name: Option<String>,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
}
impl From<UserRecord> for UserResponse {
	fn from(user: UserRecord) -> Self {
		Self {
			id: user.id,
			email: user.email,
			full_name: user.full_name,
			created_at: user.created_at,
		}
	}
}

// A user record is only reachable by the user it describes, so `owner_id` and `user_id` must
// match for any of these to find a row.
impl QuillService {
	pub async fn get_user(&self, owner_id: Uuid, user_id: Uuid) -> Result<UserResponse> {
		Ok(self.get_owned::<UserRecord>(owner_id, user_id).await?.into())
	}

	pub async fn update_user(
		&self,
		owner_id: Uuid,
		user_id: Uuid,
		req: UpdateUserRequest,
	) -> Result<UserResponse> {
		let Some(full_name) = req.full_name else {
			return Err(Error::InvalidRequest { message: "No fields to update.".to_string() });
		};
		let patch = UserPatch { full_name: Some(full_name) };

		Ok(self.update_owned::<UserRecord>(owner_id, user_id, &patch).await?.into())
	}

	/// Removes the account together with its notes, tags, and links.
	pub async fn delete_user(&self, owner_id: Uuid, user_id: Uuid) -> Result<DeleteResponse> {
		self.delete_owned::<UserRecord>(owner_id, user_id).await
	}
}
