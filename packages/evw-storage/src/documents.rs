use std::fs;

use crate::{Error, Result, artifacts::ArtifactLayout};
use evw_chunking::Section;

/// Supplies a document's plain text and its ordered section map.
pub trait DocumentSource
where
	Self: Send + Sync,
{
	fn text(&self, doc_id: &str) -> Result<String>;

	/// An empty list means the document has no known sections.
	fn sections(&self, doc_id: &str) -> Result<Vec<Section>>;
}

/// Reads documents from `processed/papers/` under the artifact root.
#[derive(Clone, Debug)]
pub struct FsDocumentSource {
	layout: ArtifactLayout,
}
impl FsDocumentSource {
	pub fn new(layout: ArtifactLayout) -> Self {
		Self { layout }
	}
}
impl DocumentSource for FsDocumentSource {
	fn text(&self, doc_id: &str) -> Result<String> {
		let path = self.layout.paper_text(doc_id);

		match fs::read_to_string(&path) {
			Ok(text) => Ok(text),
			Err(err) if err.kind() == std::io::ErrorKind::NotFound =>
				Err(Error::NotFound(format!("document text {}", path.display()))),
			Err(source) => Err(Error::Io { path, source }),
		}
	}

	fn sections(&self, doc_id: &str) -> Result<Vec<Section>> {
		let path = self.layout.paper_sections(doc_id);
		let sections: Option<Vec<Section>> = crate::artifacts::read_json(&path)?;

		if sections.is_none() {
			tracing::debug!(doc_id, "No section map found. Treating the document as unsectioned.");
		}

		Ok(sections.unwrap_or_default())
	}
}
