use std::any::Any;

use axum::{
	Json, Router,
	extract::{
		DefaultBodyLimit, FromRequest, FromRequestParts, Multipart, State,
		multipart::{MultipartError, MultipartRejection},
		rejection::{JsonRejection, PathRejection},
	},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::{auth::AuthUser, state::AppState};
use quill_service::{
	CreateNoteRequest, CreateTagRequest, DeleteResponse, NoteWithTags, TagResponse,
	TranscribeResponse, TranscriptionInput, UpdateNoteRequest, UpdateTagRequest,
	UpdateUserRequest, UserResponse,
};

// Room for multipart boundaries and part headers on top of the audio itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1_024;
const INTERNAL_MESSAGE: &str = "Internal server error.";

pub fn router(state: AppState) -> Router {
	let upload_limit =
		state.service.cfg.transcription.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES);

	Router::new()
		.route("/health", get(health))
		.route("/notes", get(list_notes).post(create_note))
		.route("/notes/{id}", get(get_note).put(update_note).delete(delete_note))
		.route("/tags", get(list_tags).post(create_tag))
		.route("/tags/{id}", get(get_tag).put(update_tag).delete(delete_tag))
		.route("/users/{id}", get(get_user).put(update_user).delete(delete_user))
		.route("/transcribe", post(transcribe).layer(DefaultBodyLimit::max(upload_limit)))
		.layer(CatchPanicLayer::custom(handle_panic))
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn list_notes(
	State(state): State<AppState>,
	user: AuthUser,
) -> Result<Json<Vec<NoteWithTags>>, ApiError> {
	let response = state.service.list_notes(user.id).await?;

	Ok(Json(response))
}

async fn create_note(
	State(state): State<AppState>,
	user: AuthUser,
	ApiJson(payload): ApiJson<CreateNoteRequest>,
) -> Result<Json<NoteWithTags>, ApiError> {
	let outcome = state.service.create_note(user.id, payload).await?;

	Ok(Json(outcome.note))
}

async fn get_note(
	State(state): State<AppState>,
	user: AuthUser,
	ApiPath(note_id): ApiPath<Uuid>,
) -> Result<Json<NoteWithTags>, ApiError> {
	let response = state.service.get_note(user.id, note_id).await?;

	Ok(Json(response))
}

async fn update_note(
	State(state): State<AppState>,
	user: AuthUser,
	ApiPath(note_id): ApiPath<Uuid>,
	ApiJson(payload): ApiJson<UpdateNoteRequest>,
) -> Result<Json<NoteWithTags>, ApiError> {
	let response = state.service.update_note(user.id, note_id, payload).await?;

	Ok(Json(response))
}

async fn delete_note(
	State(state): State<AppState>,
	user: AuthUser,
	ApiPath(note_id): ApiPath<Uuid>,
) -> Result<Json<DeleteResponse>, ApiError> {
	let response = state.service.delete_note(user.id, note_id).await?;

	Ok(Json(response))
}

async fn list_tags(
	State(state): State<AppState>,
	user: AuthUser,
) -> Result<Json<Vec<TagResponse>>, ApiError> {
	let response = state.service.list_tags(user.id).await?;

	Ok(Json(response))
}

async fn create_tag(
	State(state): State<AppState>,
	user: AuthUser,
	ApiJson(payload): ApiJson<CreateTagRequest>,
) -> Result<Json<TagResponse>, ApiError> {
	let response = state.service.create_tag(user.id, payload).await?;

	Ok(Json(response))
}

async fn get_tag(
	State(state): State<AppState>,
	user: AuthUser,
	ApiPath(tag_id): ApiPath<Uuid>,
) -> Result<Json<TagResponse>, ApiError> {
	let response = state.service.get_tag(user.id, tag_id).await?;

	Ok(Json(response))
}

async fn update_tag(
	State(state): State<AppState>,
	user: AuthUser,
	ApiPath(tag_id): ApiPath<Uuid>,
	ApiJson(payload): ApiJson<UpdateTagRequest>,
) -> Result<Json<TagResponse>, ApiError> {
	let response = state.service.update_tag(user.id, tag_id, payload).await?;

	Ok(Json(response))
}

async fn delete_tag(
	State(state): State<AppState>,
	user: AuthUser,
	ApiPath(tag_id): ApiPath<Uuid>,
) -> Result<Json<DeleteResponse>, ApiError> {
	let response = state.service.delete_tag(user.id, tag_id).await?;

	Ok(Json(response))
}

async fn get_user(
	State(state): State<AppState>,
	user: AuthUser,
	ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
	let response = state.service.get_user(user.id, user_id).await?;

	Ok(Json(response))
}

async fn update_user(
	State(state): State<AppState>,
	user: AuthUser,
	ApiPath(user_id): ApiPath<Uuid>,
	ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
	let response = state.service.update_user(user.id, user_id, payload).await?;

	Ok(Json(response))
}

async fn delete_user(
	State(state): State<AppState>,
	user: AuthUser,
	ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Json<DeleteResponse>, ApiError> {
	let response = state.service.delete_user(user.id, user_id).await?;

	Ok(Json(response))
}

/// Reads the `file` part of the upload; other parts are ignored.
async fn transcribe(
	State(state): State<AppState>,
	_user: AuthUser,
	multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<TranscribeResponse>, ApiError> {
	let mut multipart = multipart.map_err(|err| ApiError::invalid_request(err.body_text()))?;
	let mut file = None;

	while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
		if field.name() != Some("file") {
			continue;
		}

		let file_name = field.file_name().map(ToString::to_string);
		let content_type = field.content_type().map(ToString::to_string);
		let bytes = field.bytes().await.map_err(multipart_error)?;

		file = Some(TranscriptionInput { bytes: bytes.to_vec(), file_name, content_type });
	}

	let response = state.service.transcribe(file).await?;

	Ok(Json(response))
}

fn multipart_error(err: MultipartError) -> ApiError {
	ApiError::invalid_request(err.body_text())
}

fn handle_panic(_err: Box<dyn Any + Send + 'static>) -> Response {
	tracing::error!("Request handler panicked.");

	ApiError::internal("INTERNAL_ERROR").into_response()
}

/// JSON body extractor whose rejections use the API error shape.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
struct ApiJson<T>(T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
struct ApiPath<T>(T);

#[derive(Debug, Serialize)]
struct ErrorBody {
	error: String,
	error_code: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}

	pub fn unauthorized() -> Self {
		Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Unauthorized")
	}

	fn invalid_request(message: impl Into<String>) -> Self {
		Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message)
	}

	// Details of server-side failures stay in the logs.
	fn internal(error_code: &str) -> Self {
		Self::new(StatusCode::INTERNAL_SERVER_ERROR, error_code, INTERNAL_MESSAGE)
	}
}

impl From<quill_service::Error> for ApiError {
	fn from(err: quill_service::Error) -> Self {
		use quill_service::Error;

		match err {
			Error::Unauthorized { .. } => Self::unauthorized(),
			Error::InvalidRequest { message } => Self::invalid_request(message),
			Error::NotFound { message } => Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message),
			Error::Conflict { message } => Self::new(StatusCode::BAD_REQUEST, "CONFLICT", message),
			Error::Storage { message } => {
				tracing::warn!(error = %message, "Store rejected request data.");

				Self::new(StatusCode::BAD_REQUEST, "STORAGE_ERROR", "Request data was rejected.")
			},
			Error::Internal { message } => {
				tracing::error!(error = %message, "Internal error.");

				Self::internal("INTERNAL_ERROR")
			},
			Error::Provider { message } => {
				tracing::error!(error = %message, "Transcription provider failed.");

				Self::internal("PROVIDER_ERROR")
			},
		}
	}
}

impl From<JsonRejection> for ApiError {
	fn from(rejection: JsonRejection) -> Self {
		Self::invalid_request(rejection.body_text())
	}
}

impl From<PathRejection> for ApiError {
	fn from(rejection: PathRejection) -> Self {
		Self::invalid_request(rejection.body_text())
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error: self.message, error_code: self.error_code };

		(self.status, Json(body)).into_response()
	}
}
