use time::OffsetDateTime;
use uuid::Uuid;

use crate::store::OwnedEntity;

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct UserRecord {
	pub id: Uuid,
	pub email: String,
	pub full_name: Option<String>,
	pub created_at: OffsetDateTime,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct NoteRecord {
	pub id: Uuid,
	pub user_id: Uuid,
	pub title: String,
	pub r#type: String,
	pub transcript: String,
	pub summary: Option<String>,
	pub media_url: Option<String>,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct TagRecord {
	pub id: Uuid,
	pub user_id: Uuid,
	pub name: String,
	pub created_at: OffsetDateTime,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct NoteTagRecord {
	pub note_id: Uuid,
	pub tag_id: Uuid,
	pub linked_at: OffsetDateTime,
}

/// A note joined with the names of its linked tags, in link order.
///
/// An entry is `None` when a link points at a tag that no longer resolves.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct NoteWithTagRefs {
	#[sqlx(flatten)]
	pub note: NoteRecord,
	pub tag_names: Vec<Option<String>>,
}

#[derive(Clone, Debug)]
pub struct NotePatch {
	pub title: Option<String>,
	pub r#type: Option<String>,
	pub transcript: Option<String>,
	pub summary: Option<String>,
	pub media_url: Option<String>,
	pub updated_at: OffsetDateTime,
}

#[derive(Clone, Debug, Default)]
pub struct TagPatch {
	pub name: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct UserPatch {
	pub full_name: Option<String>,
}

impl OwnedEntity for NoteRecord {
	type Patch = NotePatch;

	const KIND: &'static str = "Note";
	const OWNER_COLUMN: &'static str = "user_id";
	const TABLE: &'static str = "notes";
}

impl OwnedEntity for TagRecord {
	type Patch = TagPatch;

	const KIND: &'static str = "Tag";
	const OWNER_COLUMN: &'static str = "user_id";
	const TABLE: &'static str = "tags";
}

// A user owns only its own row.
impl OwnedEntity for UserRecord {
	type Patch = UserPatch;

	const KIND: &'static str = "User";
	const OWNER_COLUMN: &'static str = "id";
	const TABLE: &'static str = "users";
}

impl NotePatch {
	pub fn is_empty(&self) -> bool {
		self.title.is_none()
			&& self.r#type.is_none()
			&& self.transcript.is_none()
			&& self.summary.is_none()
			&& self.media_url.is_none()
	}
}
