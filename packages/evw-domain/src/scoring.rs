use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
	claim::{self, VerificationRecord, VerificationResult},
	credibility::ReviewerWeights,
	synthesis::Decision,
};
use evw_config::Scoring;

const NEUTRAL_SCORE: f64 = 0.5;

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct VerificationScore {
	pub score: f64,
	pub decision: Decision,
	pub reviewers_scored: usize,
}

pub fn record_score(result: VerificationResult, cfg: &Scoring) -> f64 {
	match result {
		VerificationResult::True => 1.0,
		VerificationResult::PartiallyTrue => cfg.partial_weight,
		VerificationResult::False => 0.0,
	}
}

/// Credibility-weighted verification score.
///
/// Each reviewer contributes the mean score of their verified claims, weighted by their
/// credibility. Reviewers missing from `weights` are ignored. With no usable weight the score
/// is 0.5 and the decision `Neutral`. Otherwise the decision is `Accept` at or above
/// `cfg.accept_threshold`, else `Reject`.
pub fn verification_score(
	records: &[VerificationRecord],
	weights: &ReviewerWeights,
	cfg: &Scoring,
) -> VerificationScore {
	let mut per_reviewer: BTreeMap<&str, (f64, usize)> = BTreeMap::new();

	for record in records {
		let Some(reviewer) = claim::reviewer_id(&record.id) else {
			continue;
		};

		if !weights.contains_key(reviewer) {
			continue;
		}

		let entry = per_reviewer.entry(reviewer).or_insert((0.0, 0));

		entry.0 += record_score(record.result, cfg);
		entry.1 += 1;
	}

	let mut weighted = 0.0;
	let mut total_weight = 0.0;

	for (reviewer, (sum, count)) in &per_reviewer {
		let Some(weight) = weights.get(*reviewer).map(|weight| weight.weight) else {
			continue;
		};

		weighted += sum / *count as f64 * weight;
		total_weight += weight;
	}

	let reviewers_scored = per_reviewer.len();

	if total_weight <= 0.0 {
		return VerificationScore {
			score: NEUTRAL_SCORE,
			decision: Decision::Neutral,
			reviewers_scored,
		};
	}

	let score = weighted / total_weight;
	let decision =
		if score >= cfg.accept_threshold { Decision::Accept } else { Decision::Reject };

	VerificationScore { score, decision, reviewers_scored }
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::credibility::ReviewerWeight;

	fn weight(value: f64) -> ReviewerWeight {
		ReviewerWeight {
			weight: value,
			hollowness: 0.0,
			hallucination: 0.0,
			claim_count: 1,
			evidenced_claim_count: 1,
			false_claim_count: 0,
		}
	}

	fn record(id: &str, result: VerificationResult) -> VerificationRecord {
		VerificationRecord { id: id.to_string(), result, reason: String::new(), confidence: 0.5 }
	}

	#[test]
	fn weights_reviewer_means_by_credibility() {
		let weights: ReviewerWeights = [("R1", 1.0), ("R2", 0.5)]
			.into_iter()
			.map(|(id, value)| (id.to_string(), weight(value)))
			.collect();
		let records = vec![
			record("R1-C1", VerificationResult::True),
			record("R1-C2", VerificationResult::PartiallyTrue),
			record("R2-C1", VerificationResult::False),
			record("R3-C1", VerificationResult::True),
		];
		let result = verification_score(&records, &weights, &Scoring::default());

		// R1 mean 0.75 at weight 1.0, R2 mean 0.0 at weight 0.5.
		assert!((result.score - 0.5).abs() < 1e-12);
		assert_eq!(result.decision, Decision::Accept);
		assert_eq!(result.reviewers_scored, 2);
	}

	#[test]
	fn partial_weight_is_configurable() {
		let weights: ReviewerWeights = [("R1".to_string(), weight(0.8))].into_iter().collect();
		let records = vec![record("R1-C1", VerificationResult::PartiallyTrue)];
		let cfg = Scoring { partial_weight: 0.7, accept_threshold: 0.5 };

		assert!((verification_score(&records, &weights, &cfg).score - 0.7).abs() < 1e-12);
	}

	#[test]
	fn no_weight_is_neutral() {
		let result = verification_score(&[], &ReviewerWeights::new(), &Scoring::default());

		assert_eq!(result.score, NEUTRAL_SCORE);
		assert_eq!(result.decision, Decision::Neutral);
		assert_eq!(result.reviewers_scored, 0);
	}

	#[test]
	fn zero_weight_reviewers_give_no_recommendation() {
		let weights: ReviewerWeights = [("R1".to_string(), weight(0.0))].into_iter().collect();
		let records = vec![record("R1-C1", VerificationResult::True)];
		let result = verification_score(&records, &weights, &Scoring::default());

		assert_eq!(result.score, NEUTRAL_SCORE);
		assert_eq!(result.decision, Decision::Neutral);
		assert_eq!(result.reviewers_scored, 1);
	}
}
