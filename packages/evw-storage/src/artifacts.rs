use std::{
	collections::BTreeMap,
	fs,
	path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{Error, Result};
use evw_domain::{
	claim::{Claim, VerificationRecord},
	credibility::ReviewerWeights,
	synthesis::SynthesisResult,
};

/// Verification files are written as a list; older runs stored an object keyed by claim id.
#[derive(Deserialize)]
#[serde(untagged)]
enum RecordsFile {
	List(Vec<VerificationRecord>),
	ByClaim(BTreeMap<String, VerificationRecord>),
}

/// Per-document artifact paths below `storage.data_dir`.
#[derive(Clone, Debug)]
pub struct ArtifactLayout {
	root: PathBuf,
}
impl ArtifactLayout {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn paper_text(&self, doc_id: &str) -> PathBuf {
		self.papers_dir().join(format!("{doc_id}.txt"))
	}

	pub fn paper_sections(&self, doc_id: &str) -> PathBuf {
		self.papers_dir().join(format!("{doc_id}_sections.json"))
	}

	pub fn claims(&self, doc_id: &str) -> PathBuf {
		self.root.join("processed").join("extracted").join(format!("{doc_id}_claims.json"))
	}

	pub fn verifications(&self, doc_id: &str) -> PathBuf {
		self.results_dir("verifications").join(format!("{doc_id}_verified.json"))
	}

	pub fn weights(&self, doc_id: &str) -> PathBuf {
		self.results_dir("weights").join(format!("{doc_id}_weights.json"))
	}

	pub fn synthesis(&self, doc_id: &str) -> PathBuf {
		self.results_dir("synthesis").join(format!("{doc_id}_synthesis.json"))
	}

	pub fn report(&self, doc_id: &str) -> PathBuf {
		self.results_dir("synthesis").join(format!("{doc_id}_report.md"))
	}

	/// `None` when no claims file exists.
	pub fn load_claims(&self, doc_id: &str) -> Result<Option<Vec<Claim>>> {
		read_json(&self.claims(doc_id))
	}

	pub fn save_claims(&self, doc_id: &str, claims: &[Claim]) -> Result<PathBuf> {
		let path = self.claims(doc_id);

		write_json(&path, &claims)?;

		Ok(path)
	}

	/// `None` when no verification file exists.
	pub fn load_verifications(&self, doc_id: &str) -> Result<Option<Vec<VerificationRecord>>> {
		let file: Option<RecordsFile> = read_json(&self.verifications(doc_id))?;

		Ok(file.map(|file| match file {
			RecordsFile::List(records) => records,
			RecordsFile::ByClaim(records) => records.into_values().collect(),
		}))
	}

	pub fn save_verifications(
		&self,
		doc_id: &str,
		records: &[VerificationRecord],
	) -> Result<PathBuf> {
		let path = self.verifications(doc_id);

		write_json(&path, &records)?;

		Ok(path)
	}

	pub fn load_weights(&self, doc_id: &str) -> Result<Option<ReviewerWeights>> {
		read_json(&self.weights(doc_id))
	}

	pub fn save_weights(&self, doc_id: &str, weights: &ReviewerWeights) -> Result<PathBuf> {
		let path = self.weights(doc_id);

		write_json(&path, weights)?;

		Ok(path)
	}

	pub fn load_synthesis(&self, doc_id: &str) -> Result<Option<SynthesisResult>> {
		read_json(&self.synthesis(doc_id))
	}

	pub fn save_synthesis(&self, doc_id: &str, synthesis: &SynthesisResult) -> Result<PathBuf> {
		let path = self.synthesis(doc_id);

		write_json(&path, synthesis)?;

		Ok(path)
	}

	pub fn save_report(&self, doc_id: &str, report: &str) -> Result<PathBuf> {
		let path = self.report(doc_id);

		write_bytes(&path, report.as_bytes())?;

		Ok(path)
	}

	fn papers_dir(&self) -> PathBuf {
		self.root.join("processed").join("papers")
	}

	fn results_dir(&self, kind: &str) -> PathBuf {
		self.root.join("results").join(kind)
	}
}

/// Reads and decodes a JSON artifact. A missing file is `Ok(None)`.
pub fn read_json<T>(path: &Path) -> Result<Option<T>>
where
	T: DeserializeOwned,
{
	let raw = match fs::read(path) {
		Ok(raw) => raw,
		Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
		Err(source) => return Err(Error::Io { path: path.to_path_buf(), source }),
	};
	let value = serde_json::from_slice(&raw)
		.map_err(|source| Error::Decode { path: path.to_path_buf(), source })?;

	Ok(Some(value))
}

/// Pretty-prints `value` to `path`, creating parent directories as needed.
pub fn write_json<T>(path: &Path, value: &T) -> Result<()>
where
	T: ?Sized + Serialize,
{
	let bytes = serde_json::to_vec_pretty(value)?;

	write_bytes(path, &bytes)
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent)
			.map_err(|source| Error::Io { path: parent.to_path_buf(), source })?;
	}

	fs::write(path, bytes).map_err(|source| Error::Io { path: path.to_path_buf(), source })?;

	tracing::debug!(path = %path.display(), bytes = bytes.len(), "Wrote artifact.");

	Ok(())
}
