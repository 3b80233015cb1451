use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{DeleteResponse, Error, QuillService, Result};
use quill_storage::models::{TagPatch, TagRecord};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CreateTagRequest {
	#[serde(default)]
	pub name: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UpdateTagRequest {
	pub name: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TagResponse {
	pub id: Uuid,
	pub user_id: Uuid,
	pub name: String,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
}
impl From<TagRecord> for TagResponse {
	fn from(tag: TagRecord) -> Self {
		Self { id: tag.id, user_id: tag.user_id, name: tag.name, created_at: tag.created_at }
	}
}

impl QuillService {
	pub async fn list_tags(&self, owner_id: Uuid) -> Result<Vec<TagResponse>> {
		let tags = self.store.list_tags(owner_id).await?;

		Ok(tags.into_iter().map(TagResponse::from).collect())
	}

	/// Returns the owner's existing tag when the name is already taken.
	pub async fn create_tag(&self, owner_id: Uuid, req: CreateTagRequest) -> Result<TagResponse> {
		if req.name.trim().is_empty() {
			return Err(Error::InvalidRequest { message: "name is required.".to_string() });
		}

		let (tag, _) = self.resolve_tag(owner_id, &req.name).await?;

		Ok(tag.into())
	}

	pub async fn get_tag(&self, owner_id: Uuid, tag_id: Uuid) -> Result<TagResponse> {
		Ok(self.get_owned::<TagRecord>(owner_id, tag_id).await?.into())
	}

	pub async fn update_tag(
		&self,
		owner_id: Uuid,
		tag_id: Uuid,
		req: UpdateTagRequest,
	) -> Result<TagResponse> {
		let Some(name) = req.name else {
			return Err(Error::InvalidRequest { message: "No fields to update.".to_string() });
		};

		if name.trim().is_empty() {
			return Err(Error::InvalidRequest { message: "name must be non-empty.".to_string() });
		}

		let patch = TagPatch { name: Some(name) };

		Ok(self.update_owned::<TagRecord>(owner_id, tag_id, &patch).await?.into())
	}

	/// Unlinks the tag from every note; the notes and their other tags stay.
	pub async fn delete_tag(&self, owner_id: Uuid, tag_id: Uuid) -> Result<DeleteResponse> {
		self.delete_owned::<TagRecord>(owner_id, tag_id).await
	}
}
