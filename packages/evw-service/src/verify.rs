use std::time::Duration;

use evw_config::{LlmProviderConfig, Verification};
use evw_domain::{
	claim::{Claim, VerificationRecord, VerificationResult},
	section,
};
use evw_providers::{
	JudgeProvider,
	judge::{self, JudgeOutcome},
};
use evw_retrieval::{Retriever, ScoredSegment};

pub const NO_CONTEXT_REASON: &str = "No relevant context found in the paper to verify this claim.";

const CONTEXT_SEPARATOR: &str = "\n\n";
const TRUNCATION_MARK: &str = "...";

/// Checks evidenced claims against one document.
///
/// A claim without evidence is skipped. Every other claim yields exactly one record: retrieval
/// builds the evidence context, the judge rules on it, and any failure along the way becomes a
/// low-confidence `Partially_True` record instead of an error.
pub struct Verifier<'a> {
	retriever: &'a Retriever,
	judge: &'a dyn JudgeProvider,
	judge_cfg: &'a LlmProviderConfig,
	settings: &'a Verification,
	sections: &'a [String],
}
impl<'a> Verifier<'a> {
	pub fn new(
		retriever: &'a Retriever,
		judge: &'a dyn JudgeProvider,
		judge_cfg: &'a LlmProviderConfig,
		settings: &'a Verification,
		sections: &'a [String],
	) -> Self {
		Self { retriever, judge, judge_cfg, settings, sections }
	}

	/// Verifies claims one at a time, in input order.
	pub async fn verify_all(&self, claims: &[Claim]) -> Vec<VerificationRecord> {
		let pending = claims.iter().filter(|claim| claim.has_evidence()).count();

		tracing::info!(
			claims = claims.len(),
			pending,
			retriever = %self.retriever.name(),
			"Verifying evidenced claims."
		);

		let mut records = Vec::with_capacity(pending);

		for claim in claims {
			if let Some(record) = self.verify(claim).await {
				tracing::info!(
					claim_id = %record.id,
					result = record.result.as_str(),
					confidence = record.confidence,
					"Claim verified."
				);

				records.push(record);
			}
		}

		records
	}

	/// `None` when the claim carries no evidence and is skipped.
	pub async fn verify(&self, claim: &Claim) -> Option<VerificationRecord> {
		if !claim.has_evidence() {
			return None;
		}

		let context = match self.retrieve_context(claim).await {
			Ok(context) => context,
			Err(reason) => return Some(self.fallback(claim, reason)),
		};

		if context.is_empty() {
			return Some(self.fallback(claim, NO_CONTEXT_REASON.to_string()));
		}

		Some(self.consult_judge(claim, &context).await)
	}

	async fn retrieve_context(&self, claim: &Claim) -> Result<String, String> {
		let section_filter = if self.sections.is_empty() {
			None
		} else {
			section::identify_section(claim, self.sections)
		};

		if let Some(section) = section_filter.as_deref() {
			tracing::debug!(claim_id = %claim.id, section, "Routed claim to section.");
		}

		let outcome = self
			.retriever
			.retrieve(&claim.query(), self.settings.top_k as usize, section_filter.as_deref())
			.await
			.map_err(|err| {
				tracing::warn!(claim_id = %claim.id, error = %err, "Retrieval failed.");

				format!("Error during verification: {err}")
			})?;

		Ok(build_context(&outcome.hits, self.settings.max_context_chars as usize))
	}

	async fn consult_judge(&self, claim: &Claim, context: &str) -> VerificationRecord {
		let messages = judge::build_messages(&claim.statement, claim.substantiation(), context);
		let timeout = Duration::from_millis(self.settings.oracle_timeout_ms);
		let call = self.judge.complete(self.judge_cfg, &messages);
		let content = match tokio::time::timeout(timeout, call).await {
			Ok(Ok(content)) => content,
			Ok(Err(err)) => {
				tracing::warn!(
					claim_id = %claim.id,
					provider_id = %self.judge_cfg.provider_id,
					error = %err,
					"Judge call failed."
				);

				return self.fallback(claim, format!("Error during verification: {err}"));
			},
			Err(_) => {
				tracing::warn!(
					claim_id = %claim.id,
					provider_id = %self.judge_cfg.provider_id,
					timeout_ms = self.settings.oracle_timeout_ms,
					"Judge call timed out."
				);

				return self.fallback(
					claim,
					format!(
						"Error during verification: oracle timed out after {} ms",
						self.settings.oracle_timeout_ms
					),
				);
			},
		};

		match judge::parse_outcome(&content) {
			JudgeOutcome::Verdict(verdict) => VerificationRecord {
				id: claim.id.clone(),
				result: verdict.result,
				reason: verdict.reason,
				confidence: verdict.confidence,
			},
			JudgeOutcome::Malformed { reason } => {
				tracing::warn!(claim_id = %claim.id, %reason, "Judge output is malformed.");

				self.fallback(claim, reason)
			},
		}
	}

	fn fallback(&self, claim: &Claim, reason: String) -> VerificationRecord {
		VerificationRecord {
			id: claim.id.clone(),
			result: VerificationResult::PartiallyTrue,
			reason,
			confidence: self.settings.fallback_confidence,
		}
	}
}

/// Joins hit texts with blank lines. Past `max_chars` characters the context is cut on a
/// character boundary and marked with `...`.
pub fn build_context(hits: &[ScoredSegment], max_chars: usize) -> String {
	let texts: Vec<&str> = hits.iter().map(|hit| hit.segment.text.as_str()).collect();
	let joined = texts.join(CONTEXT_SEPARATOR);

	match joined.char_indices().nth(max_chars) {
		Some((cut, _)) => format!("{}{TRUNCATION_MARK}", &joined[..cut]),
		None => joined,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use evw_chunking::Segment;

	fn hit(text: &str) -> ScoredSegment {
		ScoredSegment {
			segment: Segment {
				text: text.to_string(),
				start_offset: 0,
				end_offset: text.len(),
				section: None,
			},
			score: 1.0,
		}
	}

	#[test]
	fn context_joins_hits_with_blank_lines() {
		assert_eq!(build_context(&[hit("one"), hit("two")], 100), "one\n\ntwo");
		assert_eq!(build_context(&[], 100), "");
	}

	#[test]
	fn context_is_cut_on_char_boundaries() {
		assert_eq!(build_context(&[hit("héllo wörld")], 4), "héll...");
		assert_eq!(build_context(&[hit("abc")], 3), "abc");
	}
}
