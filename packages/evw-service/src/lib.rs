pub mod pipeline;
pub mod report;
pub mod retriever;
pub mod verify;

mod error;

pub use error::{Error, Result};
pub use pipeline::{IndexSummary, RunSummary, SynthesisRun, VerificationRun};

use std::sync::Arc;

use evw_config::Config;
use evw_providers::{EmbeddingProvider, HttpProviders, JudgeProvider, RerankProvider};
use evw_storage::{
	artifacts::ArtifactLayout,
	documents::{DocumentSource, FsDocumentSource},
};

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub rerank: Arc<dyn RerankProvider>,
	pub judge: Arc<dyn JudgeProvider>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		rerank: Arc<dyn RerankProvider>,
		judge: Arc<dyn JudgeProvider>,
	) -> Self {
		Self { embedding, rerank, judge }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(HttpProviders);

		Self { embedding: provider.clone(), rerank: provider.clone(), judge: provider }
	}
}

pub struct EvwService {
	pub cfg: Config,
	pub layout: ArtifactLayout,
	pub documents: Arc<dyn DocumentSource>,
	pub providers: Providers,
}
impl EvwService {
	pub fn new(cfg: Config) -> Self {
		Self::with_providers(cfg, Providers::default())
	}

	/// Reads documents and artifacts from `storage.data_dir`.
	pub fn with_providers(cfg: Config, providers: Providers) -> Self {
		let layout = ArtifactLayout::new(cfg.storage.data_dir.clone());
		let documents = Arc::new(FsDocumentSource::new(layout.clone()));

		Self { cfg, layout, documents, providers }
	}

	pub fn with_documents(mut self, documents: Arc<dyn DocumentSource>) -> Self {
		self.documents = documents;

		self
	}
}
