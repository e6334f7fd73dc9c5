use std::sync::Arc;

use crate::{BaseRetriever, Result, RetrievalOutcome};
use evw_config::{ProviderConfig, RetrievalRerank};
use evw_providers::RerankProvider;

pub struct Reranker {
	pub provider: Arc<dyn RerankProvider>,
	pub cfg: ProviderConfig,
}

/// Re-orders a base retriever's candidates by pairwise relevance alone.
pub struct RerankingRetriever {
	base: BaseRetriever,
	reranker: Option<Reranker>,
	enabled: bool,
	initial_top_k: usize,
}
impl RerankingRetriever {
	/// A missing `reranker` leaves the base ranking untouched.
	pub fn new(base: BaseRetriever, reranker: Option<Reranker>, cfg: &RetrievalRerank) -> Self {
		Self { base, reranker, enabled: cfg.enabled, initial_top_k: cfg.initial_top_k as usize }
	}

	pub fn base(&self) -> &BaseRetriever {
		&self.base
	}

	pub async fn retrieve(
		&self,
		query: &str,
		k: usize,
		section_filter: Option<&str>,
	) -> Result<RetrievalOutcome> {
		let Some(reranker) = self.reranker.as_ref().filter(|_| self.enabled) else {
			return self.base.retrieve(query, k, section_filter).await;
		};
		let initial_k = self.initial_top_k.max(k);
		let mut outcome = self.base.retrieve(query, initial_k, section_filter).await?;

		if outcome.hits.is_empty() {
			return Ok(outcome);
		}

		let docs: Vec<String> = outcome.hits.iter().map(|hit| hit.segment.text.clone()).collect();

		match reranker.provider.rerank(&reranker.cfg, query, &docs).await {
			Ok(scores) if scores.len() == docs.len() => {
				for (hit, score) in outcome.hits.iter_mut().zip(scores) {
					hit.score = score;
				}

				crate::sort_hits(&mut outcome.hits);
			},
			Ok(scores) => {
				tracing::warn!(
					provider_id = %reranker.cfg.provider_id,
					expected = docs.len(),
					received = scores.len(),
					"Rerank score count mismatch. Keeping the base ranking."
				);
			},
			Err(err) => {
				tracing::warn!(
					provider_id = %reranker.cfg.provider_id,
					error = %err,
					"Reranking failed. Keeping the base ranking."
				);
			},
		}

		outcome.hits.truncate(k);

		Ok(outcome)
	}
}
