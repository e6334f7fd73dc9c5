use std::{io, path::PathBuf};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to access {path:?}: {source}")]
	Io { path: PathBuf, source: io::Error },
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error(transparent)]
	Regex(#[from] regex::Error),
	#[error("{message}")]
	Provider { message: String },
	#[error("{message}")]
	InvalidIndex { message: String },
}
