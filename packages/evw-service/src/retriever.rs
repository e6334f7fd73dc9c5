use std::sync::Arc;

use crate::{Error, EvwService, Result};
use evw_chunking::ChunkingConfig;
use evw_config::{EmbeddingProviderConfig, RetrievalStrategy};
use evw_retrieval::{
	BaseRetriever, Retriever,
	corpus::Corpus,
	hybrid::HybridRetriever,
	lexical::LexicalRetriever,
	rerank::{Reranker, RerankingRetriever},
	semantic::{SemanticIndex, SemanticRetriever},
	store::{self, IndexStore},
};

impl EvwService {
	/// Loads and chunks one document.
	pub fn corpus(&self, doc_id: &str) -> Result<Arc<Corpus>> {
		let text = self.documents.text(doc_id)?;
		let sections = self.documents.sections(doc_id)?;
		let corpus = Corpus::new(text, &sections, ChunkingConfig::from(&self.cfg.chunking));

		tracing::info!(
			doc_id,
			segments = corpus.segments().len(),
			sections = corpus.section_names().len(),
			"Chunked document."
		);

		Ok(Arc::new(corpus))
	}

	/// Assembles the configured retrieval strategy for one document.
	///
	/// A semantic index that cannot be built is fatal for the semantic strategy and degrades
	/// the hybrid strategy to lexical retrieval.
	pub async fn build_retriever(&self, doc_id: &str, corpus: Arc<Corpus>) -> Result<Retriever> {
		let retrieval = &self.cfg.retrieval;
		let base = match retrieval.strategy {
			RetrievalStrategy::Lexical =>
				BaseRetriever::Lexical(LexicalRetriever::new(corpus, &retrieval.lexical)?),
			RetrievalStrategy::Semantic => {
				let semantic = self.semantic_retriever(doc_id, &corpus).await.map_err(|err| {
					Error::Configuration {
						message: format!("Semantic retrieval is unavailable: {err}"),
					}
				})?;

				BaseRetriever::Semantic(semantic)
			},
			RetrievalStrategy::Hybrid => {
				let semantic = match self.semantic_retriever(doc_id, &corpus).await {
					Ok(semantic) => Some(semantic),
					Err(err) => {
						tracing::warn!(
							doc_id,
							error = %err,
							"Semantic index unavailable. Hybrid retrieval degrades to lexical."
						);

						None
					},
				};
				let lexical = LexicalRetriever::new(corpus, &retrieval.lexical)?;

				BaseRetriever::Hybrid(HybridRetriever::new(lexical, semantic, &retrieval.hybrid))
			},
		};

		if !retrieval.rerank.enabled {
			return Ok(Retriever::Plain(base));
		}

		let reranker = match self.cfg.providers.rerank.as_ref() {
			Some(cfg) =>
				Some(Reranker { provider: self.providers.rerank.clone(), cfg: cfg.clone() }),
			None => {
				tracing::warn!(
					"Reranking is enabled without a rerank provider. Keeping the base ranking."
				);

				None
			},
		};

		Ok(Retriever::Reranked(RerankingRetriever::new(base, reranker, &retrieval.rerank)))
	}

	/// Loads the cached index for `doc_id` or embeds the corpus afresh.
	pub async fn semantic_index(&self, doc_id: &str, corpus: &Corpus) -> Result<SemanticIndex> {
		let cfg = self.embedding_cfg()?;
		let settings = &self.cfg.retrieval.semantic;
		let store = settings.index_dir.as_ref().map(IndexStore::new);
		let index = store::load_or_build(
			store.as_ref(),
			settings,
			doc_id,
			corpus.segments(),
			corpus.chunking(),
			self.providers.embedding.as_ref(),
			cfg,
		)
		.await?;

		tracing::info!(
			doc_id,
			provider_id = %cfg.provider_id,
			model = %cfg.model,
			segments = index.len(),
			"Semantic index ready."
		);

		Ok(index)
	}

	async fn semantic_retriever(&self, doc_id: &str, corpus: &Corpus) -> Result<SemanticRetriever> {
		let index = self.semantic_index(doc_id, corpus).await?;

		Ok(SemanticRetriever::new(
			Arc::new(index),
			self.providers.embedding.clone(),
			self.embedding_cfg()?.clone(),
		))
	}

	fn embedding_cfg(&self) -> Result<&EmbeddingProviderConfig> {
		self.cfg.providers.embedding.as_ref().ok_or_else(|| Error::Configuration {
			message: "providers.embedding is required for semantic retrieval.".to_string(),
		})
	}
}
