use std::ops::Range;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use evw_config::{ChunkStrategy, Chunking};

const PARAGRAPH_BREAK: &str = "\n\n";

#[derive(Clone, Debug)]
pub struct ChunkingConfig {
	pub strategy: ChunkStrategy,
	pub chunk_size: usize,
	pub chunk_overlap: usize,
	pub max_segments: usize,
}
impl From<&Chunking> for ChunkingConfig {
	fn from(cfg: &Chunking) -> Self {
		Self {
			strategy: cfg.strategy,
			chunk_size: cfg.chunk_size as usize,
			chunk_overlap: cfg.chunk_overlap as usize,
			max_segments: cfg.max_segments as usize,
		}
	}
}

/// A contiguous slice of the document. `text` is always `document[start_offset..end_offset]`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Segment {
	pub text: String,
	pub start_offset: usize,
	pub end_offset: usize,
	pub section: Option<String>,
}

/// A named section as handed over by the text-extraction layer.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Section {
	pub name: String,
	pub text: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SectionSpan {
	pub name: String,
	pub start: usize,
	pub end: usize,
}

/// Locates each section's text in the document, scanning forward so that sections are matched
/// in map order. Sections whose text cannot be found are dropped.
pub fn locate_sections(text: &str, sections: &[Section]) -> Vec<SectionSpan> {
	let mut spans = Vec::with_capacity(sections.len());
	let mut cursor = 0_usize;

	for section in sections {
		let Some((start, len)) = find_from(text, &section.text, cursor) else {
			tracing::debug!(section = %section.name, "Section text not found in document.");

			continue;
		};
		let end = start + len;

		spans.push(SectionSpan { name: section.name.clone(), start, end });

		cursor = end;
	}

	spans
}

pub fn chunk_document(text: &str, spans: &[SectionSpan], cfg: &ChunkingConfig) -> Vec<Segment> {
	let mut segments = split_range(text, 0..text.len(), cfg);

	tag_sections(&mut segments, spans);

	segments
}

/// Splits `text[range]` and reports offsets relative to the whole `text`.
pub fn split_range(text: &str, range: Range<usize>, cfg: &ChunkingConfig) -> Vec<Segment> {
	let Some(slice) = text.get(range.clone()) else {
		tracing::warn!(
			start = range.start,
			end = range.end,
			"Chunk range is not on character boundaries."
		);

		return Vec::new();
	};
	let local = match cfg.strategy {
		ChunkStrategy::Paragraph => paragraph_ranges(slice, cfg.chunk_size),
		ChunkStrategy::Window => window_ranges(slice, cfg.chunk_size, cfg.chunk_overlap),
	};

	if local.len() > cfg.max_segments {
		tracing::warn!(
			segments = local.len(),
			max_segments = cfg.max_segments,
			"Segment count exceeds the cap. Keeping the earliest segments."
		);
	}

	local
		.into_iter()
		.take(cfg.max_segments)
		.map(|piece| Segment {
			text: slice[piece.clone()].to_string(),
			start_offset: range.start + piece.start,
			end_offset: range.start + piece.end,
			section: None,
		})
		.collect()
}

/// Tags every segment with the section containing its midpoint, falling back to the first
/// section it overlaps.
pub fn tag_sections(segments: &mut [Segment], spans: &[SectionSpan]) {
	if spans.is_empty() {
		return;
	}

	for segment in segments.iter_mut() {
		segment.section = section_for(segment.start_offset, segment.end_offset, spans)
			.map(|span| span.name.clone());
	}
}

fn section_for(start: usize, end: usize, spans: &[SectionSpan]) -> Option<&SectionSpan> {
	// Twice the midpoint keeps the comparison in integers.
	let mid2 = start + end;

	spans
		.iter()
		.find(|span| 2 * span.start <= mid2 && mid2 <= 2 * span.end)
		.or_else(|| spans.iter().find(|span| start < span.end && end > span.start))
}

fn find_from(text: &str, needle: &str, cursor: usize) -> Option<(usize, usize)> {
	let haystack = text.get(cursor..)?;

	for candidate in [needle, needle.trim()] {
		if candidate.is_empty() {
			return None;
		}
		if let Some(idx) = haystack.find(candidate) {
			return Some((cursor + idx, candidate.len()));
		}
	}

	None
}

fn paragraph_ranges(text: &str, chunk_size: usize) -> Vec<Range<usize>> {
	let mut out = Vec::new();
	let mut current: Option<Range<usize>> = None;

	for paragraph in paragraphs(text) {
		if let Some(open) = current.as_mut()
			&& paragraph.end - open.start <= chunk_size
		{
			open.end = paragraph.end;

			continue;
		}
		if let Some(done) = current.take() {
			out.push(done);
		}
		if paragraph.len() <= chunk_size {
			current = Some(paragraph);

			continue;
		}

		let mut pieces = sentence_ranges(text, paragraph, chunk_size);

		// The trailing sentence group stays open so the next paragraph may join it.
		current = pieces.pop();

		out.extend(pieces);
	}

	if let Some(done) = current {
		out.push(done);
	}

	out
}

fn paragraphs(text: &str) -> Vec<Range<usize>> {
	let mut out = Vec::new();
	let mut start = 0_usize;

	for (idx, _) in text.match_indices(PARAGRAPH_BREAK) {
		if let Some(range) = trim_range(text, start..idx) {
			out.push(range);
		}

		start = idx + PARAGRAPH_BREAK.len();
	}

	if let Some(range) = trim_range(text, start..text.len()) {
		out.push(range);
	}

	out
}

fn sentence_ranges(text: &str, paragraph: Range<usize>, chunk_size: usize) -> Vec<Range<usize>> {
	let mut out = Vec::new();
	let mut current: Option<Range<usize>> = None;
	let base = paragraph.start;

	for (idx, sentence) in text[paragraph].split_sentence_bound_indices() {
		let Some(sentence) = trim_range(text, base + idx..base + idx + sentence.len()) else {
			continue;
		};

		if let Some(open) = current.as_mut()
			&& sentence.end - open.start <= chunk_size
		{
			open.end = sentence.end;

			continue;
		}
		if let Some(done) = current.take() {
			out.push(done);
		}

		current = Some(sentence);
	}

	if let Some(done) = current {
		out.push(done);
	}

	out
}

fn window_ranges(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<Range<usize>> {
	let mut out = Vec::new();
	let mut start = 0_usize;

	while start < text.len() {
		let mut end = floor_boundary(text, (start + chunk_size).min(text.len()));

		if end <= start {
			end = ceil_boundary(text, start + 1);
		}
		if !text[start..end].trim().is_empty() {
			out.push(start..end);
		}
		if end >= text.len() {
			break;
		}

		// Rounding up keeps the overlap within the configured amount.
		let next = ceil_boundary(text, end.saturating_sub(chunk_overlap));

		start = if next > start && next < end { next } else { end };
	}

	out
}

fn trim_range(text: &str, range: Range<usize>) -> Option<Range<usize>> {
	let slice = &text[range.clone()];
	let trimmed = slice.trim();

	if trimmed.is_empty() {
		return None;
	}

	let start = range.start + (slice.len() - slice.trim_start().len());

	Some(start..start + trimmed.len())
}

fn floor_boundary(text: &str, mut idx: usize) -> usize {
	while idx > 0 && !text.is_char_boundary(idx) {
		idx -= 1;
	}

	idx
}

fn ceil_boundary(text: &str, mut idx: usize) -> usize {
	while idx < text.len() && !text.is_char_boundary(idx) {
		idx += 1;
	}

	idx.min(text.len())
}
