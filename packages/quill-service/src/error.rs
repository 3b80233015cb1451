pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Unauthorized: {message}")]
	Unauthorized { message: String },
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Conflict: {message}")]
	Conflict { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Internal error: {message}")]
	Internal { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
}
impl Error {
	/// The caller-facing part of the error, without the variant prefix.
	pub fn message(&self) -> &str {
		match self {
			Self::Unauthorized { message }
			| Self::InvalidRequest { message }
			| Self::NotFound { message }
			| Self::Conflict { message }
			| Self::Storage { message }
			| Self::Internal { message }
			| Self::Provider { message } => message,
		}
	}
}

impl From<quill_storage::Error> for Error {
	fn from(err: quill_storage::Error) -> Self {
		match err {
			// The database rejected the data itself (constraint or check violation).
			quill_storage::Error::Sqlx(sqlx::Error::Database(inner)) =>
				Self::Storage { message: inner.to_string() },
			quill_storage::Error::Sqlx(inner) => Self::Internal { message: inner.to_string() },
			quill_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			quill_storage::Error::NotFound(message) => Self::NotFound { message },
			quill_storage::Error::Conflict(message) => Self::Conflict { message },
			quill_storage::Error::Unavailable(message) => Self::Internal { message },
		}
	}
}

impl From<quill_providers::Error> for Error {
	fn from(err: quill_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
