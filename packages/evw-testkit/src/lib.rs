mod error;

pub use error::{Error, Result};

use std::{
	collections::VecDeque,
	env, fs,
	path::{Path, PathBuf},
	process,
	sync::{
		Mutex,
		atomic::{AtomicU64, AtomicUsize, Ordering},
	},
	time::{Duration, SystemTime, UNIX_EPOCH},
};

use color_eyre::eyre;
use serde_json::{Map, Value};

use evw_config::{
	Chunking, Config, EmbeddingProviderConfig, LlmProviderConfig, ProviderConfig, Providers,
	Retrieval, Scoring, Service, Storage, Synthesis, Verification, Weighting,
};
use evw_providers::{BoxFuture, EmbeddingProvider, JudgeProvider, RerankProvider};

static NEXT_DIR: AtomicU64 = AtomicU64::new(0);

/// A scratch directory removed on drop.
pub struct TempDir {
	path: PathBuf,
}
impl TempDir {
	pub fn new(prefix: &str) -> Result<Self> {
		let nanos = SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map_err(|err| Error::Message(err.to_string()))?
			.as_nanos();
		let seq = NEXT_DIR.fetch_add(1, Ordering::Relaxed);
		let path = env::temp_dir().join(format!("{prefix}-{}-{nanos}-{seq}", process::id()));

		fs::create_dir_all(&path).map_err(|source| Error::Io { path: path.clone(), source })?;

		Ok(Self { path })
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}
impl Drop for TempDir {
	fn drop(&mut self) {
		let _ = fs::remove_dir_all(&self.path);
	}
}

/// A valid configuration pointing at unreachable providers. Tests swap in fakes.
pub fn test_config(data_dir: &Path) -> Config {
	Config {
		service: Service { log_level: "debug".to_string() },
		storage: Storage { data_dir: data_dir.to_path_buf() },
		providers: Providers {
			embedding: Some(embedding_config(16)),
			rerank: Some(ProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "test-key".to_string(),
				path: "/rerank".to_string(),
				model: "keyword-rerank".to_string(),
				timeout_ms: 1_000,
				default_headers: Map::new(),
			}),
			judge: LlmProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "test-key".to_string(),
				path: "/chat/completions".to_string(),
				model: "scripted-judge".to_string(),
				temperature: 0.0,
				max_tokens: 1_000,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
		},
		chunking: Chunking::default(),
		retrieval: Retrieval::default(),
		verification: Verification::default(),
		weighting: Weighting::default(),
		synthesis: Synthesis::default(),
		scoring: Scoring::default(),
	}
}

pub fn embedding_config(dimensions: u32) -> EmbeddingProviderConfig {
	EmbeddingProviderConfig {
		provider_id: "test".to_string(),
		api_base: "http://127.0.0.1:1".to_string(),
		api_key: "test-key".to_string(),
		path: "/embeddings".to_string(),
		model: "hash-embedding".to_string(),
		dimensions,
		timeout_ms: 1_000,
		default_headers: Map::new(),
	}
}

/// Deterministic bag-of-words embedding. Each lowercase word lands in a blake3-chosen bucket.
pub struct HashEmbedder {
	pub dimension: usize,
	calls: AtomicUsize,
}
impl HashEmbedder {
	pub fn new(dimension: usize) -> Self {
		Self { dimension: dimension.max(1), calls: AtomicUsize::new(0) }
	}

	/// Number of `embed` calls served so far.
	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	pub fn vector(&self, text: &str) -> Vec<f32> {
		let mut vector = vec![0.0; self.dimension];

		for word in words(text) {
			let hash = blake3::hash(word.as_bytes());
			let bytes = hash.as_bytes();
			let bucket = u64::from_le_bytes([
				bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
			]) as usize % self.dimension;

			vector[bucket] += 1.0;
		}

		vector
	}
}
impl EmbeddingProvider for HashEmbedder {
	fn embed<'a>(
		&'a self,
		_: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let vectors = texts.iter().map(|text| self.vector(text)).collect();

		Box::pin(async move { Ok(vectors) })
	}
}

pub struct FailingEmbedder;
impl EmbeddingProvider for FailingEmbedder {
	fn embed<'a>(
		&'a self,
		_: &'a EmbeddingProviderConfig,
		_: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(async { Err(eyre::eyre!("Embedding backend is unavailable.")) })
	}
}

/// Scores each document by the share of query words it contains.
pub struct KeywordReranker;
impl RerankProvider for KeywordReranker {
	fn rerank<'a>(
		&'a self,
		_: &'a ProviderConfig,
		query: &'a str,
		docs: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>> {
		let query_words = words(query);
		let scores = docs
			.iter()
			.map(|doc| {
				let doc_words = words(doc);
				let shared = query_words.iter().filter(|word| doc_words.contains(word)).count();

				if query_words.is_empty() { 0.0 } else { shared as f32 / query_words.len() as f32 }
			})
			.collect();

		Box::pin(async move { Ok(scores) })
	}
}

pub struct FailingReranker;
impl RerankProvider for FailingReranker {
	fn rerank<'a>(
		&'a self,
		_: &'a ProviderConfig,
		_: &'a str,
		_: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>> {
		Box::pin(async { Err(eyre::eyre!("Rerank backend is unavailable.")) })
	}
}

/// Replays queued completions in order and records every request it sees.
/// An exhausted queue answers with an error.
#[derive(Default)]
pub struct ScriptedJudge {
	responses: Mutex<VecDeque<String>>,
	requests: Mutex<Vec<Vec<Value>>>,
}
impl ScriptedJudge {
	pub fn new<I, S>(responses: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
			requests: Mutex::new(Vec::new()),
		}
	}

	/// Answers every request with the same verdict.
	pub fn repeating(response: &str, times: usize) -> Self {
		Self::new(std::iter::repeat_n(response.to_string(), times))
	}

	pub fn requests(&self) -> Vec<Vec<Value>> {
		self.requests.lock().map(|requests| requests.clone()).unwrap_or_default()
	}
}
impl JudgeProvider for ScriptedJudge {
	fn complete<'a>(
		&'a self,
		_: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		if let Ok(mut requests) = self.requests.lock() {
			requests.push(messages.to_vec());
		}

		let next = self.responses.lock().ok().and_then(|mut responses| responses.pop_front());

		Box::pin(async move {
			next.ok_or_else(|| eyre::eyre!("Scripted judge has no responses left."))
		})
	}
}

pub struct FailingJudge;
impl JudgeProvider for FailingJudge {
	fn complete<'a>(
		&'a self,
		_: &'a LlmProviderConfig,
		_: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(async { Err(eyre::eyre!("Judge backend is unavailable.")) })
	}
}

/// Answers only after `delay`, to exercise oracle timeouts.
pub struct SlowJudge {
	pub delay: Duration,
	pub response: String,
}
impl JudgeProvider for SlowJudge {
	fn complete<'a>(
		&'a self,
		_: &'a LlmProviderConfig,
		_: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(async move {
			tokio::time::sleep(self.delay).await;

			Ok(self.response.clone())
		})
	}
}

/// A judge reply in the expected JSON shape.
pub fn verdict_json(result: &str, reason: &str, confidence: f64) -> String {
	serde_json::json!({
		"verification_result": result,
		"verification_reason": reason,
		"confidence": confidence,
	})
	.to_string()
}

fn words(text: &str) -> Vec<String> {
	text.split(|ch: char| !ch.is_alphanumeric())
		.filter(|word| !word.is_empty())
		.map(str::to_lowercase)
		.collect()
}
