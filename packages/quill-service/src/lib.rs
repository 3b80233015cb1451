pub mod identity;
pub mod notes;
pub mod tags;
pub mod time_serde;
pub mod transcribe;
pub mod users;

mod error;

pub use error::{Error, Result};
pub use identity::ExternalIdentity;
pub use notes::{
	CreateNoteOutcome, CreateNoteRequest, NoteType, NoteWithTags, TagLinkOp, TagLinkResult,
	UpdateNoteRequest,
};
pub use tags::{CreateTagRequest, TagResponse, UpdateTagRequest};
pub use transcribe::{TranscribeResponse, TranscriptionInput};
pub use users::{UpdateUserRequest, UserResponse};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use quill_config::{Config, ProviderConfig};
use quill_providers::transcription;
use quill_storage::{BoxFuture, OwnedEntity, OwnedRepository, RecordStore};

/// A whitespace-only tag name is never stored or linked. Every other name is kept exactly as the
/// caller sent it, with no trimming or case folding, so `" work"` and `"work"` stay distinct tags.
pub const REASON_EMPTY_TAG_NAME: &str = "EMPTY_TAG_NAME";
pub const REASON_TAG_RESOLVE_FAILED: &str = "TAG_RESOLVE_FAILED";
pub const REASON_TAG_LINK_FAILED: &str = "TAG_LINK_FAILED";

pub trait TranscriptionProvider
where
	Self: Send + Sync,
{
	fn transcribe<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		audio: Vec<u8>,
		file_name: &'a str,
		mime_type: &'a str,
	) -> BoxFuture<'a, quill_providers::Result<String>>;
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
	pub success: bool,
}

#[derive(Clone)]
pub struct Providers {
	pub transcription: Arc<dyn TranscriptionProvider>,
}

pub struct QuillService {
	pub cfg: Config,
	pub store: Arc<dyn RecordStore>,
	pub providers: Providers,
}

struct DefaultProviders;

impl TranscriptionProvider for DefaultProviders {
	fn transcribe<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		audio: Vec<u8>,
		file_name: &'a str,
		mime_type: &'a str,
	) -> BoxFuture<'a, quill_providers::Result<String>> {
		Box::pin(transcription::transcribe(cfg, audio, file_name, mime_type))
	}
}

impl Providers {
	pub fn new(transcription: Arc<dyn TranscriptionProvider>) -> Self {
		Self { transcription }
	}
}

impl Default for Providers {
	fn default() -> Self {
		Self { transcription: Arc::new(DefaultProviders) }
	}
}

impl QuillService {
	pub fn new(cfg: Config, store: Arc<dyn RecordStore>) -> Self {
		Self { cfg, store, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, store: Arc<dyn RecordStore>, providers: Providers) -> Self {
		Self { cfg, store, providers }
	}

	pub(crate) async fn get_owned<T>(&self, owner_id: Uuid, id: Uuid) -> Result<T>
	where
		T: OwnedEntity,
		dyn RecordStore: OwnedRepository<T>,
	{
		OwnedRepository::<T>::get(&*self.store, owner_id, id).await?.ok_or_else(|| not_found::<T>())
	}

	pub(crate) async fn update_owned<T>(
		&self,
		owner_id: Uuid,
		id: Uuid,
		patch: &T::Patch,
	) -> Result<T>
	where
		T: OwnedEntity,
		dyn RecordStore: OwnedRepository<T>,
	{
		OwnedRepository::<T>::update(&*self.store, owner_id, id, patch)
			.await?
			.ok_or_else(|| not_found::<T>())
	}

	pub(crate) async fn delete_owned<T>(&self, owner_id: Uuid, id: Uuid) -> Result<DeleteResponse>
	where
		T: OwnedEntity,
		dyn RecordStore: OwnedRepository<T>,
	{
		if !OwnedRepository::<T>::delete(&*self.store, owner_id, id).await? {
			return Err(not_found::<T>());
		}

		Ok(DeleteResponse { success: true })
	}
}

fn not_found<T>() -> Error
where
	T: OwnedEntity,
{
	Error::NotFound { message: format!("{} not found.", T::KIND) }
}
