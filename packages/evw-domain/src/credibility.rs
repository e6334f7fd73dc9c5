use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::claim::{self, Claim, VerificationRecord, VerificationResult};
use evw_config::Weighting;

pub type ReviewerWeights = BTreeMap<String, ReviewerWeight>;

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ReviewerWeight {
	pub weight: f64,
	pub hollowness: f64,
	pub hallucination: f64,
	#[serde(alias = "num_claims")]
	pub claim_count: usize,
	#[serde(alias = "num_claims_with_evidence")]
	pub evidenced_claim_count: usize,
	#[serde(alias = "num_false_claims")]
	pub false_claim_count: usize,
}

/// Computes a trust score for every reviewer found in `claims`.
///
/// Recomputed from scratch on every call. Claims whose id carries no reviewer prefix are
/// skipped.
pub fn compute_weights(
	claims: &[Claim],
	records: &[VerificationRecord],
	cfg: &Weighting,
) -> ReviewerWeights {
	let results = claim::results_by_claim(records);
	let mut grouped: BTreeMap<&str, Vec<&Claim>> = BTreeMap::new();

	for claim in claims {
		let Some(reviewer) = claim.reviewer_id() else {
			tracing::warn!(claim_id = %claim.id, "Claim id has no reviewer prefix. Skipping.");

			continue;
		};

		grouped.entry(reviewer).or_default().push(claim);
	}

	grouped
		.into_iter()
		.map(|(reviewer, claims)| (reviewer.to_string(), weigh_reviewer(&claims, &results, cfg)))
		.collect()
}

pub fn weigh_reviewer(
	claims: &[&Claim],
	results: &HashMap<&str, VerificationResult>,
	cfg: &Weighting,
) -> ReviewerWeight {
	let claim_count = claims.len();
	let evidenced: Vec<&&Claim> = claims.iter().filter(|claim| claim.has_evidence()).collect();
	let evidenced_claim_count = evidenced.len();
	let false_claim_count = evidenced
		.iter()
		.filter(|claim| results.get(claim.id.as_str()) == Some(&VerificationResult::False))
		.count();
	let hollowness = if claim_count == 0 {
		1.0
	} else {
		(claim_count - evidenced_claim_count) as f64 / claim_count as f64
	};
	let hallucination = if evidenced_claim_count == 0 {
		0.0
	} else {
		false_claim_count as f64 / evidenced_claim_count as f64
	};
	let weight = (1.0 - (cfg.alpha * hollowness + cfg.beta * hallucination)).clamp(0.0, 1.0);

	ReviewerWeight {
		weight,
		hollowness,
		hallucination,
		claim_count,
		evidenced_claim_count,
		false_claim_count,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reviewer_without_claims_is_fully_hollow() {
		let weight = weigh_reviewer(&[], &HashMap::new(), &Weighting::default());

		assert_eq!(weight.hollowness, 1.0);
		assert_eq!(weight.hallucination, 0.0);
		assert!((weight.weight - 0.5).abs() < 1e-12);
	}

	#[test]
	fn legacy_weight_keys_are_accepted() {
		let weight: ReviewerWeight = serde_json::from_str(
			r#"{"weight":0.75,"hollowness":0.5,"hallucination":0.0,"num_claims":4,"num_claims_with_evidence":2,"num_false_claims":0}"#,
		)
		.expect("Failed to parse weight.");

		assert_eq!(weight.claim_count, 4);
		assert_eq!(weight.evidenced_claim_count, 2);
	}
}
