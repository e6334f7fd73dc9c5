mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	ChunkStrategy, Chunking, Config, EmbeddingProviderConfig, LlmProviderConfig, ProviderConfig,
	Providers, Retrieval, RetrievalHybrid, RetrievalLexical, RetrievalRerank, RetrievalSemantic,
	RetrievalStrategy, Scoring, Service, Storage, Synthesis, Verification, Weighting,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	if raw.trim().is_empty() {
		return Err(Error::EmptyConfig { path: path.to_path_buf() });
	}

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(validation("service.log_level must be non-empty."));
	}
	if cfg.storage.data_dir.as_os_str().is_empty() {
		return Err(validation("storage.data_dir must be non-empty."));
	}
	if cfg.chunking.chunk_size == 0 {
		return Err(validation("chunking.chunk_size must be greater than zero."));
	}
	if cfg.chunking.chunk_overlap >= cfg.chunking.chunk_size {
		return Err(validation("chunking.chunk_overlap must be less than chunking.chunk_size."));
	}
	if cfg.chunking.max_segments == 0 {
		return Err(validation("chunking.max_segments must be greater than zero."));
	}
	if cfg.retrieval.lexical.max_search_chars == 0 {
		return Err(validation("retrieval.lexical.max_search_chars must be greater than zero."));
	}
	if cfg.retrieval.semantic.batch_size == 0 {
		return Err(validation("retrieval.semantic.batch_size must be greater than zero."));
	}

	let hybrid = &cfg.retrieval.hybrid;

	for (label, weight) in [
		("retrieval.hybrid.lexical_weight", hybrid.lexical_weight),
		("retrieval.hybrid.semantic_weight", hybrid.semantic_weight),
	] {
		if !weight.is_finite() || weight < 0.0 {
			return Err(validation(&format!("{label} must be a finite number zero or greater.")));
		}
	}

	if !hybrid.dual_discovery_bonus.is_finite() || hybrid.dual_discovery_bonus < 1.0 {
		return Err(validation(
			"retrieval.hybrid.dual_discovery_bonus must be a finite number 1.0 or greater.",
		));
	}
	if cfg.retrieval.rerank.enabled && cfg.retrieval.rerank.initial_top_k == 0 {
		return Err(validation("retrieval.rerank.initial_top_k must be greater than zero."));
	}
	if cfg.verification.top_k == 0 {
		return Err(validation("verification.top_k must be greater than zero."));
	}
	if cfg.verification.max_context_chars == 0 {
		return Err(validation("verification.max_context_chars must be greater than zero."));
	}
	if cfg.verification.oracle_timeout_ms == 0 {
		return Err(validation("verification.oracle_timeout_ms must be greater than zero."));
	}

	for (label, value) in [
		("verification.fallback_confidence", cfg.verification.fallback_confidence),
		("weighting.alpha", cfg.weighting.alpha),
		("weighting.beta", cfg.weighting.beta),
		("synthesis.accept_threshold", cfg.synthesis.accept_threshold),
		("scoring.partial_weight", cfg.scoring.partial_weight),
		("scoring.accept_threshold", cfg.scoring.accept_threshold),
	] {
		if !value.is_finite() {
			return Err(validation(&format!("{label} must be a finite number.")));
		}
		if !(0.0..=1.0).contains(&value) {
			return Err(validation(&format!("{label} must be in the range 0.0-1.0.")));
		}
	}

	if cfg.synthesis.topics.iter().any(|topic| topic.trim().is_empty()) {
		return Err(validation("synthesis.topics must not contain empty names."));
	}
	if cfg.retrieval.strategy == RetrievalStrategy::Semantic && cfg.providers.embedding.is_none()
	{
		return Err(validation(
			"providers.embedding is required when retrieval.strategy is semantic.",
		));
	}
	if cfg.retrieval.rerank.enabled && cfg.providers.rerank.is_none() {
		return Err(validation(
			"providers.rerank is required when retrieval.rerank.enabled is true.",
		));
	}
	if let Some(embedding) = cfg.providers.embedding.as_ref()
		&& embedding.dimensions == 0
	{
		return Err(validation("providers.embedding.dimensions must be greater than zero."));
	}

	let mut keys = vec![("judge", &cfg.providers.judge.api_key)];

	if let Some(embedding) = cfg.providers.embedding.as_ref()
		&& cfg.retrieval.strategy.needs_index()
	{
		keys.push(("embedding", &embedding.api_key));
	}
	if let Some(rerank) = cfg.providers.rerank.as_ref()
		&& cfg.retrieval.rerank.enabled
	{
		keys.push(("rerank", &rerank.api_key));
	}

	for (label, key) in keys {
		if key.trim().is_empty() {
			return Err(validation(&format!("Provider {label} api_key must be non-empty.")));
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg
		.retrieval
		.semantic
		.index_dir
		.as_deref()
		.map(|dir| dir.as_os_str().is_empty())
		.unwrap_or(false)
	{
		cfg.retrieval.semantic.index_dir = None;
	}

	for topic in &mut cfg.synthesis.topics {
		*topic = topic.trim().to_string();
	}
}

fn validation(message: &str) -> Error {
	Error::Validation { message: message.to_string() }
}
