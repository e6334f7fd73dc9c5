use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub chunking: Chunking,
	#[serde(default)]
	pub retrieval: Retrieval,
	#[serde(default)]
	pub verification: Verification,
	#[serde(default)]
	pub weighting: Weighting,
	#[serde(default)]
	pub synthesis: Synthesis,
	#[serde(default)]
	pub scoring: Scoring,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Storage {
	/// Root of the artifact tree (`processed/` and `results/` live below it).
	pub data_dir: PathBuf,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Providers {
	/// Optional. Required only when the retrieval strategy is `semantic`.
	pub embedding: Option<EmbeddingProviderConfig>,
	/// Optional. Required only when `retrieval.rerank.enabled` is true.
	pub rerank: Option<ProviderConfig>,
	pub judge: LlmProviderConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
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

#[derive(Clone, Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	#[serde(default = "default_judge_max_tokens")]
	pub max_tokens: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStrategy {
	#[default]
	Paragraph,
	Window,
}
impl ChunkStrategy {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Paragraph => "paragraph",
			Self::Window => "window",
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Chunking {
	pub strategy: ChunkStrategy,
	/// Target segment size in bytes.
	pub chunk_size: u32,
	/// Only used by the window strategy.
	pub chunk_overlap: u32,
	pub max_segments: u32,
}
impl Default for Chunking {
	fn default() -> Self {
		Self {
			strategy: ChunkStrategy::Paragraph,
			chunk_size: 500,
			chunk_overlap: 50,
			max_segments: 1_000,
		}
	}
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalStrategy {
	#[default]
	Lexical,
	Semantic,
	Hybrid,
}
impl RetrievalStrategy {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Lexical => "lexical",
			Self::Semantic => "semantic",
			Self::Hybrid => "hybrid",
		}
	}

	pub fn needs_index(self) -> bool {
		matches!(self, Self::Semantic | Self::Hybrid)
	}
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Retrieval {
	pub strategy: RetrievalStrategy,
	pub lexical: RetrievalLexical,
	pub semantic: RetrievalSemantic,
	pub hybrid: RetrievalHybrid,
	pub rerank: RetrievalRerank,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RetrievalLexical {
	pub max_search_chars: u32,
}
impl Default for RetrievalLexical {
	fn default() -> Self {
		Self { max_search_chars: 50_000 }
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RetrievalSemantic {
	/// Optional. When unset the index is built in memory on every run.
	pub index_dir: Option<PathBuf>,
	pub use_cache: bool,
	pub batch_size: u32,
}
impl Default for RetrievalSemantic {
	fn default() -> Self {
		Self { index_dir: None, use_cache: true, batch_size: 32 }
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RetrievalHybrid {
	pub lexical_weight: f32,
	pub semantic_weight: f32,
	/// Multiplier applied when both retrievers surface the same segment.
	pub dual_discovery_bonus: f32,
}
impl Default for RetrievalHybrid {
	fn default() -> Self {
		Self { lexical_weight: 0.3, semantic_weight: 0.7, dual_discovery_bonus: 1.1 }
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RetrievalRerank {
	pub enabled: bool,
	pub initial_top_k: u32,
}
impl Default for RetrievalRerank {
	fn default() -> Self {
		Self { enabled: false, initial_top_k: 20 }
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Verification {
	pub top_k: u32,
	pub max_context_chars: u32,
	pub oracle_timeout_ms: u64,
	pub fallback_confidence: f64,
}
impl Default for Verification {
	fn default() -> Self {
		Self {
			top_k: 5,
			max_context_chars: 3_000,
			oracle_timeout_ms: 60_000,
			fallback_confidence: 0.3,
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Weighting {
	/// Hollowness penalty.
	pub alpha: f64,
	/// Hallucination penalty.
	pub beta: f64,
}
impl Default for Weighting {
	fn default() -> Self {
		Self { alpha: 0.5, beta: 0.5 }
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Synthesis {
	pub accept_threshold: f64,
	pub topics: Vec<String>,
}
impl Default for Synthesis {
	fn default() -> Self {
		Self {
			accept_threshold: 0.6,
			topics: ["Novelty", "Experiments", "Writing", "Significance", "Reproducibility"]
				.into_iter()
				.map(str::to_string)
				.collect(),
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Scoring {
	/// Credit given to a `Partially_True` record in the verification score.
	pub partial_weight: f64,
	pub accept_threshold: f64,
}
impl Default for Scoring {
	fn default() -> Self {
		Self { partial_weight: 0.5, accept_threshold: 0.5 }
	}
}

fn default_judge_max_tokens() -> u32 {
	1_000
}
