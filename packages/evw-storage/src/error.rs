use std::{io, path::PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Not found: {0}")]
	NotFound(String),
	#[error("Failed to access {path:?}: {source}")]
	Io { path: PathBuf, source: io::Error },
	#[error("Failed to decode {path:?}: {source}")]
	Decode { path: PathBuf, source: serde_json::Error },
	#[error(transparent)]
	Encode(#[from] serde_json::Error),
}
