use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub security: Security,
	pub notes: Notes,
	pub transcription: Transcription,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub transcription: ProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct ProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Security {
	pub bind_localhost_only: bool,
	/// Optional. When set, every request must carry `Authorization: Bearer <token>`.
	pub api_auth_token: Option<String>,
	/// Header carrying the signed-in user's email, set by the upstream auth provider.
	#[serde(default = "default_identity_header")]
	pub identity_header: String,
	/// Header carrying the signed-in user's display name. Only read on first sign-in.
	#[serde(default = "default_name_header")]
	pub name_header: String,
}

#[derive(Debug, Deserialize)]
pub struct Notes {
	pub max_tags_per_note: usize,
	pub max_title_chars: usize,
}

#[derive(Debug, Deserialize)]
pub struct Transcription {
	pub max_upload_bytes: usize,
}

fn default_identity_header() -> String {
	"x-quill-user-email".to_string()
}

fn default_name_header() -> String {
	"x-quill-user-name".to_string()
}
