pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Configuration error: {message}")]
	Configuration { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Retrieval error: {message}")]
	Retrieval { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<evw_storage::Error> for Error {
	fn from(err: evw_storage::Error) -> Self {
		match err {
			evw_storage::Error::NotFound(message) => Self::NotFound { message },
			other => Self::Storage { message: other.to_string() },
		}
	}
}

impl From<evw_retrieval::Error> for Error {
	fn from(err: evw_retrieval::Error) -> Self {
		Self::Retrieval { message: err.to_string() }
	}
}
