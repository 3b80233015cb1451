//! Speech-to-text over an OpenAI-compatible `audio/transcriptions` endpoint.

use std::time::Duration;

use reqwest::{
	Client,
	multipart::{Form, Part},
};
use serde_json::Value;

use crate::{Error, Result};

pub async fn transcribe(
	cfg: &quill_config::ProviderConfig,
	audio: Vec<u8>,
	file_name: &str,
	mime_type: &str,
) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let part = Part::bytes(audio).file_name(file_name.to_string()).mime_str(mime_type)?;
	let form = Form::new().part("file", part).text("model", cfg.model.clone());
	let res = client
		.post(&url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.multipart(form)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_transcription_response(json)
}

fn parse_transcription_response(json: Value) -> Result<String> {
	let Some(text) = json.get("text").and_then(|v| v.as_str()) else {
		return Err(Error::InvalidResponse {
			message: "Transcription response is missing text.".to_string(),
		});
	};

	Ok(text.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_text_field() {
		let json = serde_json::json!({ "text": "buy milk", "language": "en" });
		let text = parse_transcription_response(json).expect("parse failed");

		assert_eq!(text, "buy milk");
	}

	#[test]
	fn empty_text_is_a_valid_transcript() {
		let text = parse_transcription_response(serde_json::json!({ "text": "" }))
			.expect("parse failed");

		assert!(text.is_empty());
	}

	#[test]
	fn rejects_response_without_text() {
		let err = parse_transcription_response(serde_json::json!({ "error": "quota" }))
			.expect_err("Expected an invalid response.");

		assert!(matches!(err, Error::InvalidResponse { .. }));
	}
}
