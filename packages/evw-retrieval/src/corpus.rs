use std::ops::Range;

use evw_chunking::{ChunkingConfig, Section, SectionSpan, Segment};
use evw_domain::section;

/// A chunked document with its located sections.
#[derive(Clone, Debug)]
pub struct Corpus {
	text: String,
	section_names: Vec<String>,
	spans: Vec<SectionSpan>,
	segments: Vec<Segment>,
	chunking: ChunkingConfig,
}
impl Corpus {
	pub fn new(text: String, sections: &[Section], chunking: ChunkingConfig) -> Self {
		let spans = evw_chunking::locate_sections(&text, sections);

		if spans.len() < sections.len() {
			tracing::warn!(
				sections = sections.len(),
				located = spans.len(),
				"Some section texts were not found in the document."
			);
		}

		let segments = evw_chunking::chunk_document(&text, &spans, &chunking);

		Self {
			text,
			section_names: sections.iter().map(|section| section.name.clone()).collect(),
			spans,
			segments,
			chunking,
		}
	}

	pub fn text(&self) -> &str {
		&self.text
	}

	pub fn segments(&self) -> &[Segment] {
		&self.segments
	}

	pub fn chunking(&self) -> &ChunkingConfig {
		&self.chunking
	}

	/// Section names in document order, as handed over with the document.
	pub fn section_names(&self) -> &[String] {
		&self.section_names
	}

	/// First located section whose name fuzzy-matches `filter`.
	pub fn find_span(&self, filter: &str) -> Option<&SectionSpan> {
		self.spans.iter().find(|span| section::section_matches(&span.name, filter))
	}

	/// Byte range covering at most `max_chars` characters of the document from `start`.
	pub fn char_limited(&self, range: Range<usize>, max_chars: usize) -> Range<usize> {
		let Some(slice) = self.text.get(range.clone()) else {
			return range.start..range.start;
		};
		let end = slice
			.char_indices()
			.nth(max_chars)
			.map(|(idx, _)| range.start + idx)
			.unwrap_or(range.end);

		range.start..end
	}

	/// Re-chunks one section's span. Offsets stay relative to the whole document.
	pub fn rechunk(&self, span: &SectionSpan, max_chars: usize) -> Vec<Segment> {
		let range = self.char_limited(span.start..span.end, max_chars);
		let mut segments = evw_chunking::split_range(&self.text, range, &self.chunking);

		for segment in &mut segments {
			segment.section = Some(span.name.clone());
		}

		segments
	}
}
