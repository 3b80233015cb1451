use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{
	DeleteResponse, Error, QuillService, REASON_EMPTY_TAG_NAME, REASON_TAG_LINK_FAILED,
	REASON_TAG_RESOLVE_FAILED, Result,
};
use quill_storage::models::{NotePatch, NoteRecord, NoteTagRecord, NoteWithTagRefs, TagRecord};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteType {
	#[default]
	Text,
	Audio,
	Video,
}
impl NoteType {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Text => "text",
			Self::Audio => "audio",
			Self::Video => "video",
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TagLinkOp {
	Reused,
	Created,
	Skipped,
}

/// Payload of `POST /notes`. The owner always comes from the authenticated identity; an owner
/// field in the body is ignored.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CreateNoteRequest {
	#[serde(default)]
	pub title: String,
	#[serde(rename = "type", default)]
	pub note_type: NoteType,
	#[serde(default)]
	pub transcript: String,
	pub summary: Option<String>,
	pub media_url: Option<String>,
	#[serde(default)]
	pub tags: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UpdateNoteRequest {
	pub title: Option<String>,
	#[serde(rename = "type")]
	pub note_type: Option<NoteType>,
	pub transcript: Option<String>,
	pub summary: Option<String>,
	pub media_url: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NoteWithTags {
	pub id: Uuid,
	pub user_id: Uuid,
	pub title: String,
	#[serde(rename = "type")]
	pub note_type: String,
	pub transcript: String,
	pub summary: Option<String>,
	pub media_url: Option<String>,
	pub tags: Vec<String>,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TagLinkResult {
	pub name: String,
	pub tag_id: Option<Uuid>,
	pub op: TagLinkOp,
	pub reason_code: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateNoteOutcome {
	pub note: NoteWithTags,
	pub tag_links: Vec<TagLinkResult>,
}

impl QuillService {
	/// Persists a note, then resolves and links each distinct tag name in order.
	///
	/// Tag steps are best effort: a failed lookup, insert, or link is logged and reported as a
	/// skipped [`TagLinkResult`] while the note and the remaining tags are kept.
	pub async fn create_note(
		&self,
		owner_id: Uuid,
		req: CreateNoteRequest,
	) -> Result<CreateNoteOutcome> {
		let title = validate_title(&self.cfg.notes, &req.title)?;
		let tag_names = distinct_tag_names(&req.tags);

		if tag_names.len() > self.cfg.notes.max_tags_per_note {
			return Err(Error::InvalidRequest {
				message: format!(
					"A note can carry at most {} tags.",
					self.cfg.notes.max_tags_per_note
				),
			});
		}

		let now = OffsetDateTime::now_utc();
		let record = NoteRecord {
			id: Uuid::new_v4(),
			user_id: owner_id,
			title,
			r#type: req.note_type.as_str().to_string(),
			transcript: req.transcript,
			summary: req.summary,
			media_url: req.media_url,
			created_at: now,
			updated_at: now,
		};

		self.store.insert_note(&record).await?;

		let mut tag_links = Vec::with_capacity(tag_names.len());

		for (idx, name) in tag_names.into_iter().enumerate() {
			let linked_at = now + Duration::microseconds(idx as i64);

			tag_links.push(self.link_tag(owner_id, record.id, name, linked_at).await);
		}

		let note = self.get_note(owner_id, record.id).await?;

		tracing::info!(
			note_id = %note.id,
			requested = tag_links.len(),
			linked = note.tags.len(),
			"Note created."
		);

		Ok(CreateNoteOutcome { note, tag_links })
	}

	pub async fn get_note(&self, owner_id: Uuid, note_id: Uuid) -> Result<NoteWithTags> {
		let Some(row) = self.store.note_with_tags(owner_id, note_id).await? else {
			return Err(Error::NotFound { message: "Note not found.".to_string() });
		};

		Ok(flatten_tags(row))
	}

	/// Newest first.
	pub async fn list_notes(&self, owner_id: Uuid) -> Result<Vec<NoteWithTags>> {
		let rows = self.store.notes_with_tags(owner_id).await?;

		Ok(rows.into_iter().map(flatten_tags).collect())
	}

	pub async fn update_note(
		&self,
		owner_id: Uuid,
		note_id: Uuid,
		req: UpdateNoteRequest,
	) -> Result<NoteWithTags> {
		let title =
			req.title.as_deref().map(|title| validate_title(&self.cfg.notes, title)).transpose()?;
		let patch = NotePatch {
			title,
			r#type: req.note_type.map(|note_type| note_type.as_str().to_string()),
			transcript: req.transcript,
			summary: req.summary,
			media_url: req.media_url,
			updated_at: OffsetDateTime::now_utc(),
		};

		if patch.is_empty() {
			return Err(Error::InvalidRequest { message: "No fields to update.".to_string() });
		}

		self.update_owned::<NoteRecord>(owner_id, note_id, &patch).await?;

		self.get_note(owner_id, note_id).await
	}

	/// Links of the deleted note go with it; the tags themselves stay.
	pub async fn delete_note(&self, owner_id: Uuid, note_id: Uuid) -> Result<DeleteResponse> {
		self.delete_owned::<NoteRecord>(owner_id, note_id).await
	}

	/// Finds the owner's tag with this exact name or creates it.
	///
	/// Losing a creation race to a concurrent request is not an error: the winner's row is
	/// re-read and reused.
	pub(crate) async fn resolve_tag(
		&self,
		owner_id: Uuid,
		name: &str,
	) -> Result<(TagRecord, TagLinkOp)> {
		if let Some(tag) = self.store.find_tag(owner_id, name).await? {
			return Ok((tag, TagLinkOp::Reused));
		}

		let tag = TagRecord {
			id: Uuid::new_v4(),
			user_id: owner_id,
			name: name.to_string(),
			created_at: OffsetDateTime::now_utc(),
		};

		match self.store.insert_tag(&tag).await {
			Ok(()) => Ok((tag, TagLinkOp::Created)),
			Err(quill_storage::Error::Conflict(_)) => {
				let Some(existing) = self.store.find_tag(owner_id, name).await? else {
					return Err(Error::Conflict {
						message: format!("Tag {name:?} conflicted but could not be re-read."),
					});
				};

				Ok((existing, TagLinkOp::Reused))
			},
			Err(err) => Err(err.into()),
		}
	}

	async fn link_tag(
		&self,
		owner_id: Uuid,
		note_id: Uuid,
		name: &str,
		linked_at: OffsetDateTime,
	) -> TagLinkResult {
		if name.trim().is_empty() {
			return TagLinkResult::skipped(name, None, REASON_EMPTY_TAG_NAME);
		}

		let (tag, op) = match self.resolve_tag(owner_id, name).await {
			Ok(resolved) => resolved,
			Err(err) => {
				tracing::warn!(%note_id, tag = name, error = %err, "Failed to resolve tag.");

				return TagLinkResult::skipped(name, None, REASON_TAG_RESOLVE_FAILED);
			},
		};
		let link = NoteTagRecord { note_id, tag_id: tag.id, linked_at };

		if let Err(err) = self.store.link_note_tag(&link).await {
			tracing::warn!(%note_id, tag_id = %tag.id, error = %err, "Failed to link tag.");

			return TagLinkResult::skipped(name, Some(tag.id), REASON_TAG_LINK_FAILED);
		}

		TagLinkResult { name: name.to_string(), tag_id: Some(tag.id), op, reason_code: None }
	}
}

impl TagLinkResult {
	fn skipped(name: &str, tag_id: Option<Uuid>, reason_code: &str) -> Self {
		Self {
			name: name.to_string(),
			tag_id,
			op: TagLinkOp::Skipped,
			reason_code: Some(reason_code.to_string()),
		}
	}
}

/// Exact-match deduplication keeping the first occurrence of each name.
pub fn distinct_tag_names(names: &[String]) -> Vec<&str> {
	let mut seen = HashSet::with_capacity(names.len());

	names.iter().map(String::as_str).filter(|name| seen.insert(*name)).collect()
}

/// Drops references to tags that no longer resolve.
pub fn flatten_tags(row: NoteWithTagRefs) -> NoteWithTags {
	let NoteWithTagRefs { note, tag_names } = row;

	NoteWithTags {
		id: note.id,
		user_id: note.user_id,
		title: note.title,
		note_type: note.r#type,
		transcript: note.transcript,
		summary: note.summary,
		media_url: note.media_url,
		tags: tag_names.into_iter().flatten().collect(),
		created_at: note.created_at,
		updated_at: note.updated_at,
	}
}

fn validate_title(cfg: &quill_config::Notes, raw: &str) -> Result<String> {
	let title = raw.trim();

	if title.is_empty() {
		return Err(Error::InvalidRequest { message: "title is required.".to_string() });
	}
	if title.chars().count() > cfg.max_title_chars {
		return Err(Error::InvalidRequest {
			message: format!("title must be at most {} characters.", cfg.max_title_chars),
		});
	}

	Ok(title.to_string())
}
