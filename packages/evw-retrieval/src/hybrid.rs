use std::collections::HashMap;

use crate::{
	RetrievalOutcome, ScoredSegment, lexical::LexicalRetriever, semantic::SemanticRetriever,
};
use evw_chunking::Segment;
use evw_config::RetrievalHybrid;

struct Fused {
	segment: Segment,
	lexical: Option<f32>,
	semantic: Option<f32>,
}

/// Weighted score fusion of lexical and semantic retrieval.
pub struct HybridRetriever {
	lexical: LexicalRetriever,
	semantic: Option<SemanticRetriever>,
	lexical_weight: f32,
	semantic_weight: f32,
	dual_discovery_bonus: f32,
}
impl HybridRetriever {
	/// `semantic` is `None` when no index could be built; retrieval is then lexical only.
	pub fn new(
		lexical: LexicalRetriever,
		semantic: Option<SemanticRetriever>,
		cfg: &RetrievalHybrid,
	) -> Self {
		let (lexical_weight, semantic_weight) =
			normalized_weights(cfg.lexical_weight, cfg.semantic_weight);

		Self {
			lexical,
			semantic,
			lexical_weight,
			semantic_weight,
			dual_discovery_bonus: cfg.dual_discovery_bonus,
		}
	}

	pub async fn retrieve(
		&self,
		query: &str,
		k: usize,
		section_filter: Option<&str>,
	) -> RetrievalOutcome {
		let candidate_k = k.saturating_mul(2);
		let semantic = if self.semantic_weight > 0.0 {
			let Some(retriever) = self.semantic.as_ref() else {
				tracing::warn!("Semantic index unavailable. Using lexical retrieval only.");

				return self.lexical.retrieve(query, k, section_filter);
			};

			match retriever.retrieve(query, candidate_k, section_filter).await {
				Ok(outcome) => Some(outcome),
				Err(err) => {
					tracing::warn!(
						error = %err,
						"Semantic retrieval failed. Using lexical retrieval only."
					);

					return self.lexical.retrieve(query, k, section_filter);
				},
			}
		} else {
			None
		};
		let lexical = (self.lexical_weight > 0.0)
			.then(|| self.lexical.retrieve(query, candidate_k, section_filter));
		let filter_miss = lexical.as_ref().is_some_and(|outcome| outcome.filter_miss)
			|| semantic.as_ref().is_some_and(|outcome| outcome.filter_miss);
		let mut fused: Vec<Fused> = Vec::new();
		let mut positions: HashMap<(usize, usize, String), usize> = HashMap::new();

		for (hits, is_lexical) in [(lexical, true), (semantic, false)]
			.into_iter()
			.filter_map(|(outcome, is_lexical)| outcome.map(|outcome| (outcome.hits, is_lexical)))
		{
			for hit in hits {
				let key =
					(hit.segment.start_offset, hit.segment.end_offset, hit.segment.text.clone());
				let idx = *positions.entry(key).or_insert_with(|| {
					fused.push(Fused { segment: hit.segment, lexical: None, semantic: None });

					fused.len() - 1
				});

				if is_lexical {
					fused[idx].lexical = Some(hit.score);
				} else {
					fused[idx].semantic = Some(hit.score);
				}
			}
		}

		let mut hits: Vec<ScoredSegment> = fused
			.into_iter()
			.map(|entry| {
				let mut score = self.lexical_weight * entry.lexical.unwrap_or(0.0)
					+ self.semantic_weight * entry.semantic.unwrap_or(0.0);

				if entry.lexical.is_some() && entry.semantic.is_some() {
					score *= self.dual_discovery_bonus;
				}

				ScoredSegment { segment: entry.segment, score }
			})
			.collect();

		crate::sort_hits(&mut hits);
		hits.truncate(k);

		RetrievalOutcome { hits, filter_miss }
	}
}

/// Rescales the weights to sum to one. Two zero weights become an even split.
pub fn normalized_weights(lexical: f32, semantic: f32) -> (f32, f32) {
	let total = lexical + semantic;

	if total > 0.0 { (lexical / total, semantic / total) } else { (0.5, 0.5) }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn weights_are_renormalized() {
		let (lexical, semantic) = normalized_weights(3.0, 1.0);

		assert!((lexical - 0.75).abs() < 1e-6);
		assert!((semantic - 0.25).abs() < 1e-6);
		assert_eq!(normalized_weights(0.0, 0.0), (0.5, 0.5));
		assert_eq!(normalized_weights(1.0, 0.0), (1.0, 0.0));
	}
}
