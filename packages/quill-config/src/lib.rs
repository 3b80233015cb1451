mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, Notes, Postgres, ProviderConfig, Providers, Security, Service, Storage, Transcription,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}

	let transcription = &cfg.providers.transcription;

	for (label, value) in [
		("providers.transcription.provider_id", &transcription.provider_id),
		("providers.transcription.api_base", &transcription.api_base),
		("providers.transcription.api_key", &transcription.api_key),
		("providers.transcription.model", &transcription.model),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if transcription.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.transcription.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if transcription.default_headers.values().any(|value| !value.is_string()) {
		return Err(Error::Validation {
			message: "providers.transcription.default_headers values must be strings.".to_string(),
		});
	}

	for (label, value) in [
		("security.identity_header", &cfg.security.identity_header),
		("security.name_header", &cfg.security.name_header),
	] {
		if !is_header_name(value) {
			return Err(Error::Validation {
				message: format!("{label} must be a valid HTTP header name."),
			});
		}
	}

	if cfg.security.identity_header == cfg.security.name_header {
		return Err(Error::Validation {
			message: "security.identity_header and security.name_header must differ.".to_string(),
		});
	}
	if cfg.notes.max_tags_per_note == 0 {
		return Err(Error::Validation {
			message: "notes.max_tags_per_note must be greater than zero.".to_string(),
		});
	}
	if cfg.notes.max_title_chars == 0 {
		return Err(Error::Validation {
			message: "notes.max_title_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.transcription.max_upload_bytes == 0 {
		return Err(Error::Validation {
			message: "transcription.max_upload_bytes must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.security.api_auth_token.as_deref().map(|token| token.trim().is_empty()).unwrap_or(false)
	{
		cfg.security.api_auth_token = None;
	}

	cfg.security.identity_header = cfg.security.identity_header.trim().to_ascii_lowercase();
	cfg.security.name_header = cfg.security.name_header.trim().to_ascii_lowercase();
}

fn is_header_name(value: &str) -> bool {
	!value.is_empty()
		&& value.bytes().all(|byte| byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_')
}
