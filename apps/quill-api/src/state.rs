use std::sync::Arc;

use quill_service::QuillService;
use quill_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<QuillService>,
}
impl AppState {
	/// Connects to Postgres and applies the schema before serving.
	pub async fn new(config: quill_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		Ok(Self::from_service(QuillService::new(config, Arc::new(db))))
	}

	pub fn from_service(service: QuillService) -> Self {
		Self { service: Arc::new(service) }
	}
}
