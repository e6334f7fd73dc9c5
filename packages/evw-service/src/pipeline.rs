use std::path::PathBuf;

use serde::Serialize;

use crate::{Error, EvwService, Result, report, verify::Verifier};
use evw_domain::{
	claim::{Claim, VerificationRecord, VerificationSummary},
	credibility::{self, ReviewerWeights},
	scoring::{self, VerificationScore},
	synthesis::{self, SynthesisResult},
};

#[derive(Clone, Debug, Default, Serialize)]
pub struct VerificationRun {
	pub doc_id: String,
	/// Empty when the step did not run.
	pub retriever: String,
	pub records: Vec<VerificationRecord>,
	pub summary: VerificationSummary,
	pub skipped: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct SynthesisRun {
	pub synthesis: SynthesisResult,
	pub score: VerificationScore,
	pub report: String,
	pub report_path: PathBuf,
}

#[derive(Clone, Debug, Serialize)]
pub struct RunSummary {
	pub verification: VerificationRun,
	pub weights: ReviewerWeights,
	pub synthesis: Option<SynthesisRun>,
}

#[derive(Clone, Debug, Serialize)]
pub struct IndexSummary {
	pub doc_id: String,
	pub segments: usize,
	pub dimension: usize,
	pub model: String,
	/// Whether the index lives on disk or only for this process.
	pub persisted: bool,
}

impl EvwService {
	/// Verifies every evidenced claim of `doc_id` and writes the verification records.
	pub async fn verify(&self, doc_id: &str) -> Result<VerificationRun> {
		validate_doc_id(doc_id)?;

		let empty = VerificationRun { doc_id: doc_id.to_string(), ..VerificationRun::default() };
		let Some(claims) = self.claims(doc_id)? else {
			tracing::warn!(doc_id, "No claims found. Run claim extraction first.");

			return Ok(empty);
		};
		let corpus = match self.corpus(doc_id) {
			Ok(corpus) => corpus,
			Err(Error::NotFound { message }) => {
				tracing::warn!(
					doc_id,
					%message,
					"Document text is missing. Skipping verification."
				);

				return Ok(empty);
			},
			Err(err) => return Err(err),
		};
		let retriever = self.build_retriever(doc_id, corpus.clone()).await?;
		let verifier = Verifier::new(
			&retriever,
			self.providers.judge.as_ref(),
			&self.cfg.providers.judge,
			&self.cfg.verification,
			corpus.section_names(),
		);
		let records = verifier.verify_all(&claims).await;
		let summary = VerificationSummary::tally(&records);
		let path = self.layout.save_verifications(doc_id, &records)?;

		tracing::info!(
			doc_id,
			total = summary.total,
			true_count = summary.true_count,
			false_count = summary.false_count,
			partial_count = summary.partial_count,
			path = %path.display(),
			"Verification finished."
		);

		Ok(VerificationRun {
			doc_id: doc_id.to_string(),
			retriever: retriever.name(),
			skipped: claims.len() - records.len(),
			records,
			summary,
		})
	}

	/// Recomputes reviewer credibility weights from the stored claims and records.
	pub fn weight(&self, doc_id: &str) -> Result<ReviewerWeights> {
		validate_doc_id(doc_id)?;

		let Some(claims) = self.claims(doc_id)? else {
			tracing::warn!(doc_id, "No claims found. Run claim extraction first.");

			return Ok(ReviewerWeights::new());
		};
		let Some(records) = self.layout.load_verifications(doc_id)? else {
			tracing::warn!(doc_id, "No verification records found. Run verification first.");

			return Ok(ReviewerWeights::new());
		};
		let weights = credibility::compute_weights(&claims, &records, &self.cfg.weighting);

		self.layout.save_weights(doc_id, &weights)?;

		for (reviewer, weight) in &weights {
			tracing::info!(
				doc_id,
				reviewer = %reviewer,
				weight = weight.weight,
				hollowness = weight.hollowness,
				hallucination = weight.hallucination,
				claims = weight.claim_count,
				"Reviewer weighted."
			);
		}

		Ok(weights)
	}

	/// Votes on every configured topic and writes the synthesis and the text report.
	/// `None` when an upstream artifact is missing.
	pub fn synthesize(&self, doc_id: &str) -> Result<Option<SynthesisRun>> {
		validate_doc_id(doc_id)?;

		let Some(claims) = self.claims(doc_id)? else {
			tracing::warn!(doc_id, "No claims found. Run claim extraction first.");

			return Ok(None);
		};
		let Some(records) = self.layout.load_verifications(doc_id)? else {
			tracing::warn!(doc_id, "No verification records found. Run verification first.");

			return Ok(None);
		};
		let Some(weights) = self.layout.load_weights(doc_id)? else {
			tracing::warn!(doc_id, "No reviewer weights found. Run weighting first.");

			return Ok(None);
		};
		let synthesis = synthesis::synthesize(&claims, &records, &weights, &self.cfg.synthesis);
		let score = scoring::verification_score(&records, &weights, &self.cfg.scoring);
		let summary = VerificationSummary::tally(&records);
		let report = report::render(doc_id, &weights, &synthesis, &summary, &score);

		self.layout.save_synthesis(doc_id, &synthesis)?;

		let report_path = self.layout.save_report(doc_id, &report)?;

		tracing::info!(
			doc_id,
			score = synthesis.overall.score,
			decision = synthesis.overall.decision.as_str(),
			verification_score = score.score,
			"Synthesis finished."
		);

		Ok(Some(SynthesisRun { synthesis, score, report, report_path }))
	}

	/// Verification, weighting and synthesis in sequence.
	pub async fn run(&self, doc_id: &str) -> Result<RunSummary> {
		let verification = self.verify(doc_id).await?;
		let weights = self.weight(doc_id)?;
		let synthesis = self.synthesize(doc_id)?;

		Ok(RunSummary { verification, weights, synthesis })
	}

	/// Builds, or reuses, the semantic index of `doc_id` ahead of verification.
	pub async fn index(&self, doc_id: &str) -> Result<IndexSummary> {
		validate_doc_id(doc_id)?;

		let corpus = self.corpus(doc_id)?;
		let index = self.semantic_index(doc_id, &corpus).await?;

		Ok(IndexSummary {
			doc_id: doc_id.to_string(),
			segments: index.len(),
			dimension: index.dimension(),
			model: index.model().to_string(),
			persisted: self.cfg.retrieval.semantic.index_dir.is_some(),
		})
	}

	fn claims(&self, doc_id: &str) -> Result<Option<Vec<Claim>>> {
		Ok(self.layout.load_claims(doc_id)?.filter(|claims| !claims.is_empty()))
	}
}

/// Document ids name files under the artifact root, so they must be a single path component.
pub fn validate_doc_id(doc_id: &str) -> Result<()> {
	let trimmed = doc_id.trim();

	if trimmed.is_empty() || trimmed != doc_id {
		return Err(Error::InvalidRequest {
			message: "Document id must be non-empty without surrounding whitespace.".to_string(),
		});
	}
	if doc_id.contains(['/', '\\']) || doc_id == "." || doc_id == ".." {
		return Err(Error::InvalidRequest {
			message: format!("Document id {doc_id:?} must not contain path separators."),
		});
	}

	Ok(())
}
