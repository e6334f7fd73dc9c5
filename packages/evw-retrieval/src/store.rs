use std::{
	fs,
	path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, Result, semantic::SemanticIndex};
use evw_chunking::{ChunkingConfig, Segment};
use evw_config::{EmbeddingProviderConfig, RetrievalSemantic};
use evw_providers::EmbeddingProvider;

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct IndexMeta {
	pub doc_id: String,
	pub dimension: usize,
	pub count: usize,
	pub chunk_strategy: String,
	pub chunk_size: usize,
	pub chunk_overlap: usize,
	pub model: String,
	/// blake3 of the serialized segment list.
	pub fingerprint: String,
	#[serde(with = "rfc3339")]
	pub built_at: OffsetDateTime,
}

#[derive(Deserialize, Serialize)]
struct IndexFile {
	dimension: usize,
	vectors: Vec<Vec<f32>>,
}

#[derive(Clone, Debug)]
pub struct IndexPaths {
	pub index: PathBuf,
	pub segments: PathBuf,
	pub meta: PathBuf,
}

/// On-disk home of per-document semantic indices.
#[derive(Clone, Debug)]
pub struct IndexStore {
	dir: PathBuf,
}
impl IndexStore {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { dir: dir.into() }
	}

	pub fn paths(&self, doc_id: &str) -> IndexPaths {
		IndexPaths {
			index: self.dir.join(format!("{doc_id}.index.json")),
			segments: self.dir.join(format!("{doc_id}.segments.json")),
			meta: self.dir.join(format!("{doc_id}.meta.json")),
		}
	}

	/// Writes the index triple. The meta file goes last so a partial write never validates.
	pub fn save(&self, index: &SemanticIndex, chunking: &ChunkingConfig) -> Result<IndexMeta> {
		let paths = self.paths(index.doc_id());
		let meta = IndexMeta {
			doc_id: index.doc_id().to_string(),
			dimension: index.dimension(),
			count: index.len(),
			chunk_strategy: chunking.strategy.as_str().to_string(),
			chunk_size: chunking.chunk_size,
			chunk_overlap: chunking.chunk_overlap,
			model: index.model().to_string(),
			fingerprint: fingerprint(index.segments())?,
			built_at: OffsetDateTime::now_utc(),
		};
		let file = IndexFile {
			dimension: index.dimension(),
			vectors: index.rows().map(<[f32]>::to_vec).collect(),
		};

		fs::create_dir_all(&self.dir)
			.map_err(|source| Error::Io { path: self.dir.clone(), source })?;

		write(&paths.index, &serde_json::to_vec(&file)?)?;
		write(&paths.segments, &serde_json::to_vec_pretty(index.segments())?)?;
		write(&paths.meta, &serde_json::to_vec_pretty(&meta)?)?;

		Ok(meta)
	}

	/// Loads a persisted index without re-embedding. `None` when any file is absent.
	pub fn load(&self, doc_id: &str) -> Result<Option<(SemanticIndex, IndexMeta)>> {
		let paths = self.paths(doc_id);

		if !(paths.index.exists() && paths.segments.exists() && paths.meta.exists()) {
			return Ok(None);
		}

		let meta: IndexMeta = serde_json::from_slice(&read(&paths.meta)?)?;
		let segments: Vec<Segment> = serde_json::from_slice(&read(&paths.segments)?)?;
		let file: IndexFile = serde_json::from_slice(&read(&paths.index)?)?;

		if meta.doc_id != doc_id {
			return Err(invalid(format!("Index meta names {} instead of {doc_id}.", meta.doc_id)));
		}
		if meta.count != segments.len() {
			return Err(invalid(format!(
				"Index meta counts {} segments but {} are stored.",
				meta.count,
				segments.len()
			)));
		}
		if meta.dimension != file.dimension {
			return Err(invalid(format!(
				"Index meta dimension {} disagrees with stored dimension {}.",
				meta.dimension, file.dimension
			)));
		}
		if fingerprint(&segments)? != meta.fingerprint {
			return Err(invalid(format!("Segments for {doc_id} fail the fingerprint check.")));
		}

		let index =
			SemanticIndex::from_parts(doc_id, &meta.model, file.dimension, segments, file.vectors)?;

		Ok(Some((index, meta)))
	}
}

pub fn fingerprint(segments: &[Segment]) -> Result<String> {
	let payload = serde_json::to_vec(segments)?;

	Ok(blake3::hash(&payload).to_hex().to_string())
}

/// Reuses a cached index when its segments and embedding model still match, otherwise embeds
/// from scratch. A store that cannot be written leaves the fresh index in memory only.
pub async fn load_or_build(
	store: Option<&IndexStore>,
	settings: &RetrievalSemantic,
	doc_id: &str,
	segments: &[Segment],
	chunking: &ChunkingConfig,
	embedder: &dyn EmbeddingProvider,
	cfg: &EmbeddingProviderConfig,
) -> Result<SemanticIndex> {
	if let Some(store) = store
		&& settings.use_cache
	{
		let expected = fingerprint(segments)?;

		match store.load(doc_id) {
			Ok(Some((index, meta))) => {
				if meta.fingerprint == expected
					&& meta.model == cfg.model
					&& meta.dimension == cfg.dimensions as usize
				{
					tracing::info!(doc_id, segments = meta.count, "Loaded cached semantic index.");

					return Ok(index);
				}

				tracing::info!(doc_id, "Cached semantic index is stale. Rebuilding.");
			},
			Ok(None) => {},
			Err(err) => {
				tracing::warn!(
					doc_id,
					error = %err,
					"Failed to load cached semantic index. Rebuilding."
				);
			},
		}
	}

	let batch_size = settings.batch_size as usize;
	let index = SemanticIndex::build(doc_id, segments.to_vec(), embedder, cfg, batch_size).await?;

	if let Some(store) = store
		&& let Err(err) = store.save(&index, chunking)
	{
		tracing::warn!(
			doc_id,
			error = %err,
			"Failed to persist semantic index. Keeping it in memory."
		);
	}

	Ok(index)
}

fn read(path: &Path) -> Result<Vec<u8>> {
	fs::read(path).map_err(|source| Error::Io { path: path.to_path_buf(), source })
}

fn write(path: &Path, bytes: &[u8]) -> Result<()> {
	fs::write(path, bytes).map_err(|source| Error::Io { path: path.to_path_buf(), source })
}

fn invalid(message: String) -> Error {
	Error::InvalidIndex { message }
}

mod rfc3339 {
	use serde::{Deserialize, Deserializer, Serializer};
	use time::{OffsetDateTime, format_description::well_known::Rfc3339};

	pub fn serialize<S>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let formatted = value.format(&Rfc3339).map_err(serde::ser::Error::custom)?;

		serializer.serialize_str(&formatted)
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = String::deserialize(deserializer)?;

		OffsetDateTime::parse(&raw, &Rfc3339).map_err(serde::de::Error::custom)
	}
}
