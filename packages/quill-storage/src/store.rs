//! The query interface every record store implements.
//!
//! Reads and writes of user-owned records go through [`OwnedRepository`], whose
//! implementations always conjunct the owner predicate with the id predicate. A
//! record owned by someone else is indistinguishable from a missing one.

use std::{future::Future, pin::Pin};

use uuid::Uuid;

use crate::{
	Result,
	models::{NoteRecord, NoteTagRecord, NoteWithTagRefs, TagRecord, UserRecord},
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A record that belongs to exactly one user.
pub trait OwnedEntity
where
	Self: Send + Sized,
{
	type Patch: Send + Sync;

	/// Human-readable kind, used in not-found messages.
	const KIND: &'static str;
	/// Column compared against the acting user's id.
	const OWNER_COLUMN: &'static str;
	const TABLE: &'static str;
}

pub trait OwnedRepository<T>
where
	Self: Send + Sync,
	T: OwnedEntity,
{
	fn get<'a>(&'a self, owner_id: Uuid, id: Uuid) -> BoxFuture<'a, Result<Option<T>>>;

	/// Applies `patch` and returns the updated record, or `None` when no owned row matched.
	fn update<'a>(
		&'a self,
		owner_id: Uuid,
		id: Uuid,
		patch: &'a T::Patch,
	) -> BoxFuture<'a, Result<Option<T>>>;

	/// Returns whether an owned row was deleted.
	fn delete<'a>(&'a self, owner_id: Uuid, id: Uuid) -> BoxFuture<'a, Result<bool>>;
}

pub trait RecordStore
where
	Self: OwnedRepository<NoteRecord>
		+ OwnedRepository<TagRecord>
		+ OwnedRepository<UserRecord>
		+ Send
		+ Sync,
{
	fn find_user_by_email<'a>(&'a self, email: &'a str)
	-> BoxFuture<'a, Result<Option<UserRecord>>>;

	/// Fails with [`crate::Error::Conflict`] when the email is already registered.
	fn insert_user<'a>(&'a self, user: &'a UserRecord) -> BoxFuture<'a, Result<()>>;

	fn insert_note<'a>(&'a self, note: &'a NoteRecord) -> BoxFuture<'a, Result<()>>;

	fn note_with_tags<'a>(
		&'a self,
		owner_id: Uuid,
		note_id: Uuid,
	) -> BoxFuture<'a, Result<Option<NoteWithTagRefs>>>;

	/// Newest first.
	fn notes_with_tags<'a>(&'a self, owner_id: Uuid) -> BoxFuture<'a, Result<Vec<NoteWithTagRefs>>>;

	fn find_tag<'a>(&'a self, owner_id: Uuid, name: &'a str)
	-> BoxFuture<'a, Result<Option<TagRecord>>>;

	/// Fails with [`crate::Error::Conflict`] when the owner already has a tag with this name.
	fn insert_tag<'a>(&'a self, tag: &'a TagRecord) -> BoxFuture<'a, Result<()>>;

	/// Ordered by name.
	fn list_tags<'a>(&'a self, owner_id: Uuid) -> BoxFuture<'a, Result<Vec<TagRecord>>>;

	/// Linking an already linked pair is a no-op.
	fn link_note_tag<'a>(&'a self, link: &'a NoteTagRecord) -> BoxFuture<'a, Result<()>>;
}
