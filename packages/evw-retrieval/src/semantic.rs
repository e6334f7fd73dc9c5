use std::sync::Arc;

use crate::{Error, Result, RetrievalOutcome, ScoredSegment};
use evw_chunking::Segment;
use evw_config::EmbeddingProviderConfig;
use evw_domain::section;
use evw_providers::EmbeddingProvider;

/// Normalized segment embeddings for one document. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct SemanticIndex {
	doc_id: String,
	model: String,
	dimension: usize,
	segments: Vec<Segment>,
	// Row-major, one row of `dimension` per segment.
	vectors: Vec<f32>,
}
impl SemanticIndex {
	pub async fn build(
		doc_id: &str,
		segments: Vec<Segment>,
		embedder: &dyn EmbeddingProvider,
		cfg: &EmbeddingProviderConfig,
		batch_size: usize,
	) -> Result<Self> {
		let mut dimension = None;
		let mut vectors = Vec::new();

		for batch in segments.chunks(batch_size.max(1)) {
			let texts: Vec<String> = batch.iter().map(|segment| segment.text.clone()).collect();
			let embedded = embedder.embed(cfg, &texts).await.map_err(|err| Error::Provider {
				message: format!("Failed to embed segments: {err}"),
			})?;

			if embedded.len() != texts.len() {
				return Err(Error::Provider {
					message: format!(
						"Embedding provider returned {} vectors for {} segments.",
						embedded.len(),
						texts.len()
					),
				});
			}

			for mut vector in embedded {
				let expected = *dimension.get_or_insert(vector.len());

				if vector.is_empty() || vector.len() != expected {
					return Err(Error::Provider {
						message: format!(
							"Embedding dimension mismatch. Expected {expected}, got {}.",
							vector.len()
						),
					});
				}

				normalize(&mut vector);
				vectors.extend(vector);
			}
		}

		tracing::info!(doc_id, segments = segments.len(), "Built semantic index.");

		Ok(Self {
			doc_id: doc_id.to_string(),
			model: cfg.model.clone(),
			dimension: dimension.unwrap_or(cfg.dimensions as usize),
			segments,
			vectors,
		})
	}

	/// Reassembles a persisted index. Vectors are taken as stored, never re-embedded.
	pub fn from_parts(
		doc_id: &str,
		model: &str,
		dimension: usize,
		segments: Vec<Segment>,
		rows: Vec<Vec<f32>>,
	) -> Result<Self> {
		if rows.len() != segments.len() {
			return Err(Error::InvalidIndex {
				message: format!(
					"Index for {doc_id} has {} vectors but {} segments.",
					rows.len(),
					segments.len()
				),
			});
		}
		if let Some(row) = rows.iter().find(|row| row.len() != dimension) {
			return Err(Error::InvalidIndex {
				message: format!(
					"Index for {doc_id} has a vector of dimension {}, expected {dimension}.",
					row.len()
				),
			});
		}

		Ok(Self {
			doc_id: doc_id.to_string(),
			model: model.to_string(),
			dimension,
			segments,
			vectors: rows.into_iter().flatten().collect(),
		})
	}

	pub fn doc_id(&self) -> &str {
		&self.doc_id
	}

	pub fn model(&self) -> &str {
		&self.model
	}

	pub fn dimension(&self) -> usize {
		self.dimension
	}

	pub fn segments(&self) -> &[Segment] {
		&self.segments
	}

	pub fn len(&self) -> usize {
		self.segments.len()
	}

	pub fn is_empty(&self) -> bool {
		self.segments.is_empty()
	}

	pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
		self.vectors.chunks(self.dimension.max(1))
	}

	/// Ranks segments against an already normalized query vector.
	pub fn rank(
		&self,
		query: &[f32],
		k: usize,
		section_filter: Option<&str>,
	) -> RetrievalOutcome {
		let in_section = |segment: &Segment, filter: &str| {
			segment.section.as_deref().is_some_and(|name| section::section_matches(name, filter))
		};
		let mut filter_miss = false;
		let mut candidates: Vec<usize> = match section_filter {
			Some(filter) => (0..self.segments.len())
				.filter(|idx| in_section(&self.segments[*idx], filter))
				.collect(),
			None => (0..self.segments.len()).collect(),
		};

		if let Some(filter) = section_filter
			&& candidates.is_empty()
		{
			tracing::warn!(section = %filter, "No segments in section. Searching the full index.");

			filter_miss = true;
			candidates = (0..self.segments.len()).collect();
		}

		let mut hits: Vec<ScoredSegment> = candidates
			.into_iter()
			.map(|idx| {
				let row = &self.vectors[idx * self.dimension..(idx + 1) * self.dimension];

				ScoredSegment { segment: self.segments[idx].clone(), score: dot(row, query) }
			})
			.collect();

		// Rank on raw similarity; only the reported score is clamped.
		crate::sort_hits(&mut hits);
		hits.truncate(k);

		for hit in &mut hits {
			hit.score = hit.score.clamp(0.0, 1.0);
		}

		RetrievalOutcome { hits, filter_miss }
	}
}

pub struct SemanticRetriever {
	index: Arc<SemanticIndex>,
	embedder: Arc<dyn EmbeddingProvider>,
	cfg: EmbeddingProviderConfig,
}
impl SemanticRetriever {
	pub fn new(
		index: Arc<SemanticIndex>,
		embedder: Arc<dyn EmbeddingProvider>,
		cfg: EmbeddingProviderConfig,
	) -> Self {
		Self { index, embedder, cfg }
	}

	pub fn index(&self) -> &SemanticIndex {
		&self.index
	}

	pub async fn retrieve(
		&self,
		query: &str,
		k: usize,
		section_filter: Option<&str>,
	) -> Result<RetrievalOutcome> {
		if self.index.is_empty() || k == 0 {
			return Ok(RetrievalOutcome::default());
		}

		let texts = [query.to_string()];
		let mut embedded =
			self.embedder.embed(&self.cfg, &texts).await.map_err(|err| Error::Provider {
				message: format!("Failed to embed query: {err}"),
			})?;
		let Some(mut vector) = embedded.pop() else {
			return Err(Error::Provider { message: "Query embedding is missing.".to_string() });
		};

		if vector.len() != self.index.dimension() {
			return Err(Error::Provider {
				message: format!(
					"Query embedding has dimension {} but the index uses {}.",
					vector.len(),
					self.index.dimension()
				),
			});
		}

		normalize(&mut vector);

		Ok(self.index.rank(&vector, k, section_filter))
	}
}

pub fn normalize(vector: &mut [f32]) {
	let norm = vector.iter().map(|value| value * value).sum::<f32>().sqrt();

	if norm > 0.0 && norm.is_finite() {
		for value in vector.iter_mut() {
			*value /= norm;
		}
	}
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
	a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn segment(text: &str, start: usize, section: Option<&str>) -> Segment {
		Segment {
			text: text.to_string(),
			start_offset: start,
			end_offset: start + text.len(),
			section: section.map(str::to_string),
		}
	}

	fn index() -> SemanticIndex {
		SemanticIndex::from_parts(
			"doc",
			"m",
			2,
			vec![
				segment("east", 0, Some("Method")),
				segment("north", 5, Some("Results")),
				segment("west", 11, Some("Results")),
			],
			vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![-1.0, 0.0]],
		)
		.expect("Failed to assemble index.")
	}

	#[test]
	fn scores_are_clamped_inner_products() {
		let outcome = index().rank(&[1.0, 0.0], 3, None);
		let scores: Vec<f32> = outcome.hits.iter().map(|hit| hit.score).collect();

		assert_eq!(outcome.hits[0].segment.text, "east");
		assert_eq!(scores, vec![1.0, 0.0, 0.0]);
		// Ties keep segment order.
		assert_eq!(outcome.hits[1].segment.text, "north");
	}

	#[test]
	fn negative_similarities_still_rank_by_closeness() {
		let index = SemanticIndex::from_parts(
			"doc",
			"m",
			2,
			vec![segment("opposite", 0, None), segment("closer", 9, None)],
			vec![vec![-1.0, 0.0], vec![-0.6, 0.8]],
		)
		.expect("Failed to assemble index.");
		let outcome = index.rank(&[1.0, 0.0], 1, None);

		assert_eq!(outcome.hits.len(), 1);
		assert_eq!(outcome.hits[0].segment.text, "closer");
		assert_eq!(outcome.hits[0].score, 0.0);
	}

	#[test]
	fn section_filter_restricts_candidates() {
		let outcome = index().rank(&[1.0, 0.0], 3, Some("results"));

		assert!(!outcome.filter_miss);
		assert_eq!(outcome.hits.len(), 2);
		assert!(outcome.hits.iter().all(|hit| hit.segment.section.as_deref() == Some("Results")));
	}

	#[test]
	fn empty_filter_set_falls_back_to_all_segments() {
		let outcome = index().rank(&[1.0, 0.0], 3, Some("Appendix"));

		assert!(outcome.filter_miss);
		assert_eq!(outcome.hits.len(), 3);
	}

	#[test]
	fn mismatched_rows_are_rejected() {
		let err = SemanticIndex::from_parts("doc", "m", 2, vec![segment("a", 0, None)], vec![])
			.expect_err("Expected a row count error.");

		assert!(matches!(err, Error::InvalidIndex { .. }));
	}

	#[test]
	fn normalize_yields_unit_length() {
		let mut vector = vec![3.0, 4.0];

		normalize(&mut vector);

		assert!((vector[0] - 0.6).abs() < 1e-6);
		assert!((vector[1] - 0.8).abs() < 1e-6);
	}
}
