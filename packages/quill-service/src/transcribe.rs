use serde::{Deserialize, Serialize};

use crate::{Error, QuillService, Result};

const DEFAULT_FILE_NAME: &str = "recording.webm";
const DEFAULT_MIME_TYPE: &str = "audio/webm";

#[derive(Clone, Debug, Default)]
pub struct TranscriptionInput {
	pub bytes: Vec<u8>,
	pub file_name: Option<String>,
	pub content_type: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TranscribeResponse {
	pub text: String,
	pub success: bool,
}

impl QuillService {
	/// `file` is `None` when the upload carried no file part.
	pub async fn transcribe(&self, file: Option<TranscriptionInput>) -> Result<TranscribeResponse> {
		let Some(file) = file.filter(|file| !file.bytes.is_empty()) else {
			return Err(Error::InvalidRequest { message: "No audio file provided".to_string() });
		};

		if file.bytes.len() > self.cfg.transcription.max_upload_bytes {
			return Err(Error::InvalidRequest {
				message: format!(
					"Audio file exceeds the {} byte upload limit.",
					self.cfg.transcription.max_upload_bytes
				),
			});
		}

		let file_name = file.file_name.unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());
		let mime_type = file.content_type.unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());
		let provider = &self.cfg.providers.transcription;
		let size = file.bytes.len();
		let text = match self
			.providers
			.transcription
			.transcribe(provider, file.bytes, &file_name, &mime_type)
			.await
		{
			Ok(text) => text,
			Err(err) => {
				tracing::warn!(
					provider_id = %provider.provider_id,
					model = %provider.model,
					error = %err,
					"Transcription request failed."
				);

				return Err(err.into());
			},
		};

		tracing::info!(
			provider_id = %provider.provider_id,
			bytes = size,
			chars = text.chars().count(),
			"Audio transcribed."
		);

		Ok(TranscribeResponse { text, success: true })
	}
}
