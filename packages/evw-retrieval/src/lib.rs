pub mod corpus;
pub mod hybrid;
pub mod lexical;
pub mod rerank;
pub mod semantic;
pub mod store;

mod error;

pub use error::{Error, Result};

use std::cmp::Ordering;

use evw_chunking::Segment;

use crate::{
	hybrid::HybridRetriever, lexical::LexicalRetriever, rerank::RerankingRetriever,
	semantic::SemanticRetriever,
};

#[derive(Clone, Debug, PartialEq)]
pub struct ScoredSegment {
	pub segment: Segment,
	pub score: f32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RetrievalOutcome {
	pub hits: Vec<ScoredSegment>,
	/// The requested section was not found and the whole document was searched instead.
	pub filter_miss: bool,
}

pub enum BaseRetriever {
	Lexical(LexicalRetriever),
	Semantic(SemanticRetriever),
	Hybrid(HybridRetriever),
}
impl BaseRetriever {
	pub fn name(&self) -> &'static str {
		match self {
			Self::Lexical(_) => "lexical",
			Self::Semantic(_) => "semantic",
			Self::Hybrid(_) => "hybrid",
		}
	}

	pub async fn retrieve(
		&self,
		query: &str,
		k: usize,
		section_filter: Option<&str>,
	) -> Result<RetrievalOutcome> {
		match self {
			Self::Lexical(retriever) => Ok(retriever.retrieve(query, k, section_filter)),
			Self::Semantic(retriever) => retriever.retrieve(query, k, section_filter).await,
			Self::Hybrid(retriever) => Ok(retriever.retrieve(query, k, section_filter).await),
		}
	}
}

pub enum Retriever {
	Plain(BaseRetriever),
	Reranked(RerankingRetriever),
}
impl Retriever {
	pub fn name(&self) -> String {
		match self {
			Self::Plain(base) => base.name().to_string(),
			Self::Reranked(reranking) => format!("{}+rerank", reranking.base().name()),
		}
	}

	pub async fn retrieve(
		&self,
		query: &str,
		k: usize,
		section_filter: Option<&str>,
	) -> Result<RetrievalOutcome> {
		match self {
			Self::Plain(base) => base.retrieve(query, k, section_filter).await,
			Self::Reranked(reranking) => reranking.retrieve(query, k, section_filter).await,
		}
	}
}

/// Descending order with NaN sorted last.
pub fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}

/// Stable sort by score, so equal scores keep their incoming order.
pub fn sort_hits(hits: &mut [ScoredSegment]) {
	hits.sort_by(|a, b| cmp_f32_desc(a.score, b.score));
}
