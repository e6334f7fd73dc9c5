use std::{collections::HashMap, sync::Arc};

use regex::Regex;

use crate::{Result, RetrievalOutcome, ScoredSegment, corpus::Corpus};
use evw_chunking::Segment;
use evw_config::RetrievalLexical;

const WORD_PATTERN: &str = r"\b[a-zA-Z]{3,}\b";
const STOP_WORDS: &[&str] = &[
	"the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "is",
	"are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does", "did", "will",
	"would", "should", "could", "may", "might", "must", "can", "this", "that", "these", "those",
];

/// Keyword-overlap retrieval over the document's segments.
pub struct LexicalRetriever {
	corpus: Arc<Corpus>,
	max_search_chars: usize,
	word: Regex,
}
impl LexicalRetriever {
	pub fn new(corpus: Arc<Corpus>, cfg: &RetrievalLexical) -> Result<Self> {
		Ok(Self {
			corpus,
			max_search_chars: cfg.max_search_chars as usize,
			word: Regex::new(WORD_PATTERN)?,
		})
	}

	/// Query keywords in query order. Repeats are kept since they weigh the score.
	pub fn keywords(&self, query: &str) -> Vec<String> {
		let lowered = query.to_lowercase();

		self.word
			.find_iter(&lowered)
			.map(|found| found.as_str())
			.filter(|word| !STOP_WORDS.contains(word))
			.map(str::to_string)
			.collect()
	}

	pub fn retrieve(
		&self,
		query: &str,
		k: usize,
		section_filter: Option<&str>,
	) -> RetrievalOutcome {
		let keywords = self.keywords(query);

		if keywords.is_empty() || k == 0 {
			return RetrievalOutcome::default();
		}

		let (candidates, filter_miss) = self.candidates(section_filter);
		let mut hits: Vec<ScoredSegment> = candidates
			.into_iter()
			.filter_map(|segment| {
				let score = relevance(&segment.text.to_lowercase(), &keywords);

				(score > 0.0).then_some(ScoredSegment { segment, score })
			})
			.collect();

		crate::sort_hits(&mut hits);
		hits.truncate(k);

		RetrievalOutcome { hits, filter_miss }
	}

	fn candidates(&self, section_filter: Option<&str>) -> (Vec<Segment>, bool) {
		if let Some(filter) = section_filter {
			if let Some(span) = self.corpus.find_span(filter) {
				return (self.corpus.rechunk(span, self.max_search_chars), false);
			}

			tracing::warn!(section = %filter, "Section not found. Searching the full text.");

			return (self.full_text_segments(), true);
		}

		(self.full_text_segments(), false)
	}

	fn full_text_segments(&self) -> Vec<Segment> {
		let limit =
			self.corpus.char_limited(0..self.corpus.text().len(), self.max_search_chars).end;

		self.corpus
			.segments()
			.iter()
			.filter(|segment| segment.start_offset < limit)
			.cloned()
			.collect()
	}
}

/// Density score: every query keyword found in the segment adds its multiplicity in the query,
/// normalized by twice the keyword count and capped at 1.
pub fn relevance(segment_lower: &str, keywords: &[String]) -> f32 {
	if keywords.is_empty() {
		return 0.0;
	}

	let mut counts: HashMap<&str, usize> = HashMap::new();

	for keyword in keywords {
		*counts.entry(keyword.as_str()).or_default() += 1;
	}

	let matches: usize = keywords
		.iter()
		.filter(|keyword| segment_lower.contains(keyword.as_str()))
		.map(|keyword| counts[keyword.as_str()])
		.sum();

	(matches as f32 / (keywords.len() * 2) as f32).min(1.0)
}
