#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
	#[error("Not found: {0}")]
	NotFound(String),
	#[error("Conflict: {0}")]
	Conflict(String),
	#[error("Store unavailable: {0}")]
	Unavailable(String),
}
impl Error {
	/// Maps a unique violation to [`Error::Conflict`] and a foreign-key violation to
	/// [`Error::InvalidArgument`]; other errors pass through.
	pub(crate) fn from_insert(err: sqlx::Error, what: &str) -> Self {
		let Some(db_err) = err.as_database_error() else {
			return Self::Sqlx(err);
		};

		if db_err.is_unique_violation() {
			return Self::Conflict(format!("{what} already exists."));
		}
		if db_err.is_foreign_key_violation() {
			return Self::InvalidArgument(format!("{what} references a missing record."));
		}

		Self::Sqlx(err)
	}
}
