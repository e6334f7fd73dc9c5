use serde::{Deserialize, Serialize};

use crate::{
	claim::{self, Claim, Sentiment, VerificationRecord, VerificationResult},
	credibility::ReviewerWeights,
};
use evw_config::Synthesis;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Decision {
	Accept,
	Reject,
	Neutral,
}
impl Decision {
	/// Three-way test, inclusive at both boundaries.
	pub fn from_score(score: f64, threshold: f64) -> Self {
		if score >= threshold {
			Self::Accept
		} else if score <= -threshold {
			Self::Reject
		} else {
			Self::Neutral
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Accept => "Accept",
			Self::Reject => "Reject",
			Self::Neutral => "Neutral",
		}
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ClaimContribution {
	pub claim_id: String,
	pub reviewer_id: Option<String>,
	pub statement: String,
	pub sentiment: Sentiment,
	pub reviewer_weight: f64,
	pub contribution: f64,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TopicResult {
	pub topic: String,
	pub score: f64,
	pub decision: Decision,
	pub claim_count: usize,
	pub weighted_sum: f64,
	pub total_weight: f64,
	pub claims: Vec<ClaimContribution>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct OverallResult {
	pub score: f64,
	pub decision: Decision,
	pub topics_with_claims: usize,
	pub accept_count: usize,
	pub reject_count: usize,
	pub neutral_count: usize,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SynthesisResult {
	pub topics: Vec<TopicResult>,
	pub overall: OverallResult,
}

/// Drops every claim verified `False`. Unverified claims are kept.
pub fn filter_false_claims<'a>(
	claims: &'a [Claim],
	records: &[VerificationRecord],
) -> Vec<&'a Claim> {
	let results = claim::results_by_claim(records);

	claims
		.iter()
		.filter(|claim| results.get(claim.id.as_str()) != Some(&VerificationResult::False))
		.collect()
}

/// Credibility-weighted vote over one topic. Topic names compare case-insensitively.
pub fn weighted_vote(
	topic: &str,
	claims: &[&Claim],
	weights: &ReviewerWeights,
	threshold: f64,
) -> TopicResult {
	let mut weighted_sum = 0.0;
	let mut total_weight = 0.0;
	let mut contributions = Vec::new();

	for claim in claims.iter().filter(|claim| claim.topic.eq_ignore_ascii_case(topic)) {
		let reviewer_id = claim.reviewer_id();
		let reviewer_weight = reviewer_id
			.and_then(|reviewer| weights.get(reviewer))
			.map(|weight| weight.weight)
			.unwrap_or(0.0);
		let contribution = claim.sentiment.score() * reviewer_weight;

		weighted_sum += contribution;
		total_weight += reviewer_weight;

		contributions.push(ClaimContribution {
			claim_id: claim.id.clone(),
			reviewer_id: reviewer_id.map(str::to_string),
			statement: claim.statement.clone(),
			sentiment: claim.sentiment,
			reviewer_weight,
			contribution,
		});
	}

	let score = if total_weight > 0.0 { weighted_sum / total_weight } else { 0.0 };

	TopicResult {
		topic: topic.to_string(),
		score,
		decision: Decision::from_score(score, threshold),
		claim_count: contributions.len(),
		weighted_sum,
		total_weight,
		claims: contributions,
	}
}

pub fn overall(topics: &[TopicResult], threshold: f64) -> OverallResult {
	let voted: Vec<&TopicResult> = topics.iter().filter(|topic| topic.claim_count > 0).collect();
	let count =
		|decision: Decision| voted.iter().filter(|topic| topic.decision == decision).count();

	if voted.is_empty() {
		return OverallResult {
			score: 0.0,
			decision: Decision::Neutral,
			topics_with_claims: 0,
			accept_count: 0,
			reject_count: 0,
			neutral_count: 0,
		};
	}

	let score = voted.iter().map(|topic| topic.score).sum::<f64>() / voted.len() as f64;

	OverallResult {
		score,
		decision: Decision::from_score(score, threshold),
		topics_with_claims: voted.len(),
		accept_count: count(Decision::Accept),
		reject_count: count(Decision::Reject),
		neutral_count: count(Decision::Neutral),
	}
}

pub fn synthesize(
	claims: &[Claim],
	records: &[VerificationRecord],
	weights: &ReviewerWeights,
	cfg: &Synthesis,
) -> SynthesisResult {
	let kept = filter_false_claims(claims, records);
	let topics: Vec<TopicResult> = cfg
		.topics
		.iter()
		.map(|topic| weighted_vote(topic, &kept, weights, cfg.accept_threshold))
		.collect();
	let overall = overall(&topics, cfg.accept_threshold);

	SynthesisResult { topics, overall }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn decision_boundaries_are_inclusive() {
		assert_eq!(Decision::from_score(0.6, 0.6), Decision::Accept);
		assert_eq!(Decision::from_score(-0.6, 0.6), Decision::Reject);
		assert_eq!(Decision::from_score(0.59, 0.6), Decision::Neutral);
	}

	#[test]
	fn overall_ignores_topics_without_claims() {
		let topic = |name: &str, score: f64, claim_count: usize| TopicResult {
			topic: name.to_string(),
			score,
			decision: Decision::from_score(score, 0.6),
			claim_count,
			weighted_sum: 0.0,
			total_weight: 0.0,
			claims: Vec::new(),
		};
		let result =
			overall(&[topic("A", 1.0, 2), topic("B", 0.0, 0), topic("C", 0.4, 1)], 0.6);

		assert!((result.score - 0.7).abs() < 1e-12);
		assert_eq!(result.decision, Decision::Accept);
		assert_eq!(result.topics_with_claims, 2);
		assert_eq!((result.accept_count, result.neutral_count), (1, 1));
	}
}
