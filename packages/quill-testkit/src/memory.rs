//! In-process [`RecordStore`] with the same uniqueness and cascade rules as the Postgres schema,
//! plus fault injection for exercising partial-failure paths.

use std::{
	collections::HashSet,
	sync::{Mutex, MutexGuard},
};

use time::OffsetDateTime;
use uuid::Uuid;

use quill_storage::{
	BoxFuture, Error, OwnedRepository, RecordStore, Result,
	models::{
		NotePatch, NoteRecord, NoteTagRecord, NoteWithTagRefs, TagPatch, TagRecord, UserPatch,
		UserRecord,
	},
};

#[derive(Default)]
pub struct MemoryStore {
	state: Mutex<State>,
	faults: Mutex<Faults>,
}

#[derive(Default)]
struct State {
	users: Vec<UserRecord>,
	notes: Vec<NoteRecord>,
	tags: Vec<TagRecord>,
	links: Vec<NoteTagRecord>,
}

#[derive(Default)]
struct Faults {
	unavailable: bool,
	note_inserts: bool,
	tag_lookups: HashSet<String>,
	tag_inserts: HashSet<String>,
	links: HashSet<String>,
	racing_tags: HashSet<String>,
	racing_users: HashSet<String>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Every subsequent call fails as if the database were unreachable.
	pub fn set_unavailable(&self, unavailable: bool) {
		self.faults().unavailable = unavailable;
	}

	pub fn fail_note_inserts(&self) {
		self.faults().note_inserts = true;
	}

	pub fn fail_tag_lookup(&self, name: &str) {
		self.faults().tag_lookups.insert(name.to_string());
	}

	pub fn fail_tag_insert(&self, name: &str) {
		self.faults().tag_inserts.insert(name.to_string());
	}

	/// Fails linking any note to a tag with this name.
	pub fn fail_link(&self, name: &str) {
		self.faults().links.insert(name.to_string());
	}

	/// The next insert of this tag name loses a race: a concurrent writer creates the tag first
	/// and the insert reports a conflict.
	pub fn race_tag_insert(&self, name: &str) {
		self.faults().racing_tags.insert(name.to_string());
	}

	/// The next insert of this email loses a race against a concurrent sign-in.
	pub fn race_user_insert(&self, email: &str) {
		self.faults().racing_users.insert(email.to_string());
	}

	pub fn users(&self) -> Vec<UserRecord> {
		self.state().users.clone()
	}

	pub fn tags_of(&self, owner_id: Uuid) -> Vec<TagRecord> {
		self.state().tags.iter().filter(|tag| tag.user_id == owner_id).cloned().collect()
	}

	pub fn tag_count(&self, owner_id: Uuid, name: &str) -> usize {
		self.state().tags.iter().filter(|tag| tag.user_id == owner_id && tag.name == name).count()
	}

	pub fn links_of(&self, note_id: Uuid) -> Vec<NoteTagRecord> {
		self.state().links.iter().filter(|link| link.note_id == note_id).cloned().collect()
	}

	pub fn note_count(&self, owner_id: Uuid) -> usize {
		self.state().notes.iter().filter(|note| note.user_id == owner_id).count()
	}

	/// Adds a link whose tag does not exist, bypassing referential checks.
	pub fn insert_dangling_link(&self, note_id: Uuid) -> Uuid {
		let tag_id = Uuid::new_v4();

		self.state().links.push(NoteTagRecord {
			note_id,
			tag_id,
			linked_at: OffsetDateTime::now_utc(),
		});

		tag_id
	}

	fn state(&self) -> MutexGuard<'_, State> {
		self.state.lock().unwrap_or_else(|err| err.into_inner())
	}

	fn faults(&self) -> MutexGuard<'_, Faults> {
		self.faults.lock().unwrap_or_else(|err| err.into_inner())
	}

	fn check_available(&self) -> Result<()> {
		if self.faults().unavailable {
			return Err(Error::Unavailable("Memory store is marked unavailable.".to_string()));
		}

		Ok(())
	}

	fn get_note(&self, owner_id: Uuid, id: Uuid) -> Result<Option<NoteRecord>> {
		self.check_available()?;

		Ok(self.state().notes.iter().find(|note| note.id == id && note.user_id == owner_id).cloned())
	}

	fn update_note(&self, owner_id: Uuid, id: Uuid, patch: &NotePatch) -> Result<Option<NoteRecord>> {
		self.check_available()?;

		let mut state = self.state();
		let Some(note) =
			state.notes.iter_mut().find(|note| note.id == id && note.user_id == owner_id)
		else {
			return Ok(None);
		};

		if let Some(title) = patch.title.as_ref() {
			note.title = title.clone();
		}
		if let Some(note_type) = patch.r#type.as_ref() {
			note.r#type = note_type.clone();
		}
		if let Some(transcript) = patch.transcript.as_ref() {
			note.transcript = transcript.clone();
		}
		if let Some(summary) = patch.summary.as_ref() {
			note.summary = Some(summary.clone());
		}
		if let Some(media_url) = patch.media_url.as_ref() {
			note.media_url = Some(media_url.clone());
		}

		note.updated_at = patch.updated_at;

		Ok(Some(note.clone()))
	}

	fn delete_note(&self, owner_id: Uuid, id: Uuid) -> Result<bool> {
		self.check_available()?;

		let mut state = self.state();
		let before = state.notes.len();

		state.notes.retain(|note| !(note.id == id && note.user_id == owner_id));

		let deleted = state.notes.len() < before;

		if deleted {
			state.links.retain(|link| link.note_id != id);
		}

		Ok(deleted)
	}

	fn get_tag(&self, owner_id: Uuid, id: Uuid) -> Result<Option<TagRecord>> {
		self.check_available()?;

		Ok(self.state().tags.iter().find(|tag| tag.id == id && tag.user_id == owner_id).cloned())
	}

	fn update_tag(&self, owner_id: Uuid, id: Uuid, patch: &TagPatch) -> Result<Option<TagRecord>> {
		self.check_available()?;

		let mut state = self.state();

		if let Some(name) = patch.name.as_ref()
			&& state.tags.iter().any(|tag| tag.user_id == owner_id && tag.id != id && &tag.name == name)
		{
			return Err(Error::Conflict("Tag already exists.".to_string()));
		}

		let Some(tag) = state.tags.iter_mut().find(|tag| tag.id == id && tag.user_id == owner_id)
		else {
			return Ok(None);
		};

		if let Some(name) = patch.name.as_ref() {
			tag.name = name.clone();
		}

		Ok(Some(tag.clone()))
	}

	fn delete_tag(&self, owner_id: Uuid, id: Uuid) -> Result<bool> {
		self.check_available()?;

		let mut state = self.state();
		let before = state.tags.len();

		state.tags.retain(|tag| !(tag.id == id && tag.user_id == owner_id));

		let deleted = state.tags.len() < before;

		if deleted {
			state.links.retain(|link| link.tag_id != id);
		}

		Ok(deleted)
	}

	fn get_user(&self, owner_id: Uuid, id: Uuid) -> Result<Option<UserRecord>> {
		self.check_available()?;

		Ok(self.state().users.iter().find(|user| user.id == id && user.id == owner_id).cloned())
	}

	fn update_user(
		&self,
		owner_id: Uuid,
		id: Uuid,
		patch: &UserPatch,
	) -> Result<Option<UserRecord>> {
		self.check_available()?;

		let mut state = self.state();
		let Some(user) = state.users.iter_mut().find(|user| user.id == id && user.id == owner_id)
		else {
			return Ok(None);
		};

		if let Some(full_name) = patch.full_name.as_ref() {
			user.full_name = Some(full_name.clone());
		}

		Ok(Some(user.clone()))
	}

	fn delete_user(&self, owner_id: Uuid, id: Uuid) -> Result<bool> {
		self.check_available()?;

		let mut state = self.state();
		let before = state.users.len();

		state.users.retain(|user| !(user.id == id && user.id == owner_id));

		if state.users.len() == before {
			return Ok(false);
		}

		let note_ids: HashSet<Uuid> =
			state.notes.iter().filter(|note| note.user_id == id).map(|note| note.id).collect();
		let tag_ids: HashSet<Uuid> =
			state.tags.iter().filter(|tag| tag.user_id == id).map(|tag| tag.id).collect();

		state.notes.retain(|note| note.user_id != id);
		state.tags.retain(|tag| tag.user_id != id);
		state
			.links
			.retain(|link| !note_ids.contains(&link.note_id) && !tag_ids.contains(&link.tag_id));

		Ok(true)
	}

	fn insert_user_record(&self, user: &UserRecord) -> Result<()> {
		self.check_available()?;

		let raced = self.faults().racing_users.remove(&user.email);
		let mut state = self.state();

		if raced {
			state.users.push(UserRecord {
				id: Uuid::new_v4(),
				email: user.email.clone(),
				full_name: user.full_name.clone(),
				created_at: user.created_at,
			});
		}
		if state.users.iter().any(|existing| existing.email == user.email) {
			return Err(Error::Conflict("User already exists.".to_string()));
		}

		state.users.push(user.clone());

		Ok(())
	}

	fn insert_note_record(&self, note: &NoteRecord) -> Result<()> {
		self.check_available()?;

		if self.faults().note_inserts {
			return Err(Error::Unavailable("Injected note insert failure.".to_string()));
		}

		let mut state = self.state();

		if !state.users.iter().any(|user| user.id == note.user_id) {
			return Err(Error::InvalidArgument("Note owner does not exist.".to_string()));
		}
		if state.notes.iter().any(|existing| existing.id == note.id) {
			return Err(Error::Conflict("Note already exists.".to_string()));
		}

		state.notes.push(note.clone());

		Ok(())
	}

	fn note_refs(state: &State, note: &NoteRecord) -> NoteWithTagRefs {
		let mut named = state
			.links
			.iter()
			.filter(|link| link.note_id == note.id)
			.map(|link| {
				let name =
					state.tags.iter().find(|tag| tag.id == link.tag_id).map(|tag| tag.name.clone());

				(link.linked_at, name)
			})
			.collect::<Vec<_>>();

		named.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

		NoteWithTagRefs {
			note: note.clone(),
			tag_names: named.into_iter().map(|(_, name)| name).collect(),
		}
	}

	fn note_with_tag_refs(&self, owner_id: Uuid, note_id: Uuid) -> Result<Option<NoteWithTagRefs>> {
		self.check_available()?;

		let state = self.state();

		Ok(state
			.notes
			.iter()
			.find(|note| note.id == note_id && note.user_id == owner_id)
			.map(|note| Self::note_refs(&state, note)))
	}

	fn notes_with_tag_refs(&self, owner_id: Uuid) -> Result<Vec<NoteWithTagRefs>> {
		self.check_available()?;

		let state = self.state();
		let mut notes = state.notes.iter().filter(|note| note.user_id == owner_id).collect::<Vec<_>>();

		notes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));

		Ok(notes.into_iter().map(|note| Self::note_refs(&state, note)).collect())
	}

	fn find_tag_record(&self, owner_id: Uuid, name: &str) -> Result<Option<TagRecord>> {
		self.check_available()?;

		if self.faults().tag_lookups.contains(name) {
			return Err(Error::Unavailable(format!("Injected lookup failure for tag {name:?}.")));
		}

		Ok(self.state().tags.iter().find(|tag| tag.user_id == owner_id && tag.name == name).cloned())
	}

	fn insert_tag_record(&self, tag: &TagRecord) -> Result<()> {
		self.check_available()?;

		let raced = {
			let mut faults = self.faults();

			if faults.tag_inserts.contains(&tag.name) {
				return Err(Error::Unavailable(format!(
					"Injected insert failure for tag {:?}.",
					tag.name
				)));
			}

			faults.racing_tags.remove(&tag.name)
		};
		let mut state = self.state();

		if !state.users.iter().any(|user| user.id == tag.user_id) {
			return Err(Error::InvalidArgument("Tag owner does not exist.".to_string()));
		}
		if raced {
			state.tags.push(TagRecord {
				id: Uuid::new_v4(),
				user_id: tag.user_id,
				name: tag.name.clone(),
				created_at: tag.created_at,
			});
		}
		if state.tags.iter().any(|existing| existing.user_id == tag.user_id && existing.name == tag.name)
		{
			return Err(Error::Conflict("Tag already exists.".to_string()));
		}

		state.tags.push(tag.clone());

		Ok(())
	}

	fn list_tag_records(&self, owner_id: Uuid) -> Result<Vec<TagRecord>> {
		self.check_available()?;

		let mut tags = self.tags_of(owner_id);

		tags.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

		Ok(tags)
	}

	fn link_records(&self, link: &NoteTagRecord) -> Result<()> {
		self.check_available()?;

		let mut state = self.state();
		let Some(tag) = state.tags.iter().find(|tag| tag.id == link.tag_id) else {
			return Err(Error::InvalidArgument("Linked tag does not exist.".to_string()));
		};

		if self.faults().links.contains(&tag.name) {
			return Err(Error::Unavailable(format!("Injected link failure for tag {:?}.", tag.name)));
		}
		if !state.notes.iter().any(|note| note.id == link.note_id) {
			return Err(Error::InvalidArgument("Linked note does not exist.".to_string()));
		}
		if state.links.iter().any(|existing| {
			existing.note_id == link.note_id && existing.tag_id == link.tag_id
		}) {
			return Ok(());
		}

		state.links.push(link.clone());

		Ok(())
	}
}

impl OwnedRepository<NoteRecord> for MemoryStore {
	fn get<'a>(&'a self, owner_id: Uuid, id: Uuid) -> BoxFuture<'a, Result<Option<NoteRecord>>> {
		let result = self.get_note(owner_id, id);

		Box::pin(async move { result })
	}

	fn update<'a>(
		&'a self,
		owner_id: Uuid,
		id: Uuid,
		patch: &'a NotePatch,
	) -> BoxFuture<'a, Result<Option<NoteRecord>>> {
		let result = self.update_note(owner_id, id, patch);

		Box::pin(async move { result })
	}

	fn delete<'a>(&'a self, owner_id: Uuid, id: Uuid) -> BoxFuture<'a, Result<bool>> {
		let result = self.delete_note(owner_id, id);

		Box::pin(async move { result })
	}
}

impl OwnedRepository<TagRecord> for MemoryStore {
	fn get<'a>(&'a self, owner_id: Uuid, id: Uuid) -> BoxFuture<'a, Result<Option<TagRecord>>> {
		let result = self.get_tag(owner_id, id);

		Box::pin(async move { result })
	}

	fn update<'a>(
		&'a self,
		owner_id: Uuid,
		id: Uuid,
		patch: &'a TagPatch,
	) -> BoxFuture<'a, Result<Option<TagRecord>>> {
		let result = self.update_tag(owner_id, id, patch);

		Box::pin(async move { result })
	}

	fn delete<'a>(&'a self, owner_id: Uuid, id: Uuid) -> BoxFuture<'a, Result<bool>> {
		let result = self.delete_tag(owner_id, id);

		Box::pin(async move { result })
	}
}

impl OwnedRepository<UserRecord> for MemoryStore {
	fn get<'a>(&'a self, owner_id: Uuid, id: Uuid) -> BoxFuture<'a, Result<Option<UserRecord>>> {
		let result = self.get_user(owner_id, id);

		Box::pin(async move { result })
	}

	fn update<'a>(
		&'a self,
		owner_id: Uuid,
		id: Uuid,
		patch: &'a UserPatch,
	) -> BoxFuture<'a, Result<Option<UserRecord>>> {
		let result = self.update_user(owner_id, id, patch);

		Box::pin(async move { result })
	}

	fn delete<'a>(&'a self, owner_id: Uuid, id: Uuid) -> BoxFuture<'a, Result<bool>> {
		let result = self.delete_user(owner_id, id);

		Box::pin(async move { result })
	}
}

impl RecordStore for MemoryStore {
	fn find_user_by_email<'a>(
		&'a self,
		email: &'a str,
	) -> BoxFuture<'a, Result<Option<UserRecord>>> {
		let result = self
			.check_available()
			.map(|()| self.state().users.iter().find(|user| user.email == email).cloned());

		Box::pin(async move { result })
	}

	fn insert_user<'a>(&'a self, user: &'a UserRecord) -> BoxFuture<'a, Result<()>> {
		let result = self.insert_user_record(user);

		Box::pin(async move { result })
	}

	fn insert_note<'a>(&'a self, note: &'a NoteRecord) -> BoxFuture<'a, Result<()>> {
		let result = self.insert_note_record(note);

		Box::pin(async move { result })
	}

	fn note_with_tags<'a>(
		&'a self,
		owner_id: Uuid,
		note_id: Uuid,
	) -> BoxFuture<'a, Result<Option<NoteWithTagRefs>>> {
		let result = self.note_with_tag_refs(owner_id, note_id);

		Box::pin(async move { result })
	}

	fn notes_with_tags<'a>(
		&'a self,
		owner_id: Uuid,
	) -> BoxFuture<'a, Result<Vec<NoteWithTagRefs>>> {
		let result = self.notes_with_tag_refs(owner_id);

		Box::pin(async move { result })
	}

	fn find_tag<'a>(
		&'a self,
		owner_id: Uuid,
		name: &'a str,
	) -> BoxFuture<'a, Result<Option<TagRecord>>> {
		let result = self.find_tag_record(owner_id, name);

		Box::pin(async move { result })
	}

	fn insert_tag<'a>(&'a self, tag: &'a TagRecord) -> BoxFuture<'a, Result<()>> {
		let result = self.insert_tag_record(tag);

		Box::pin(async move { result })
	}

	fn list_tags<'a>(&'a self, owner_id: Uuid) -> BoxFuture<'a, Result<Vec<TagRecord>>> {
		let result = self.list_tag_records(owner_id);

		Box::pin(async move { result })
	}

	fn link_note_tag<'a>(&'a self, link: &'a NoteTagRecord) -> BoxFuture<'a, Result<()>> {
		let result = self.link_records(link);

		Box::pin(async move { result })
	}
}
