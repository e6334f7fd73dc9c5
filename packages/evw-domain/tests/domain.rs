use evw_config::{Synthesis, Weighting};
use evw_domain::{
	claim::{Claim, Sentiment, SubstantiationType, VerificationRecord, VerificationResult},
	credibility::{self, ReviewerWeights},
	synthesis::{self, Decision},
};

fn claim(id: &str, topic: &str, sentiment: Sentiment, evidence: SubstantiationType) -> Claim {
	Claim {
		id: id.to_string(),
		topic: topic.to_string(),
		sentiment,
		statement: format!("Statement for {id}."),
		substantiation_type: evidence,
		substantiation_content: match evidence {
			SubstantiationType::None => None,
			_ => Some("Table 2".to_string()),
		},
	}
}

fn record(id: &str, result: VerificationResult) -> VerificationRecord {
	VerificationRecord {
		id: id.to_string(),
		result,
		reason: "Checked.".to_string(),
		confidence: 0.9,
	}
}

#[test]
fn reviewer_with_only_unevidenced_claims_has_half_weight() {
	let claims: Vec<Claim> = (1..=4)
		.map(|n| {
			claim(&format!("R2-C{n}"), "Writing", Sentiment::Negative, SubstantiationType::None)
		})
		.collect();
	let weights = credibility::compute_weights(&claims, &[], &Weighting::default());
	let r2 = &weights["R2"];

	assert_eq!(r2.hollowness, 1.0);
	assert_eq!(r2.hallucination, 0.0);
	assert!((r2.weight - 0.5).abs() < 1e-12);
	assert_eq!((r2.claim_count, r2.evidenced_claim_count, r2.false_claim_count), (4, 0, 0));
}

#[test]
fn false_claims_raise_hallucination() {
	let claims = vec![
		claim("R1-C1", "Experiments", Sentiment::Negative, SubstantiationType::SpecificCitation),
		claim("R1-C2", "Experiments", Sentiment::Negative, SubstantiationType::Vague),
	];
	let records = vec![
		record("R1-C1", VerificationResult::False),
		record("R1-C2", VerificationResult::True),
	];
	let weights = credibility::compute_weights(&claims, &records, &Weighting::default());

	assert_eq!(weights["R1"].hallucination, 0.5);
	assert!((weights["R1"].weight - 0.75).abs() < 1e-12);
}

#[test]
fn weights_are_order_independent_and_bounded() {
	let mut claims = vec![
		claim("R1-C1", "Novelty", Sentiment::Positive, SubstantiationType::SpecificCitation),
		claim("R2-C1", "Novelty", Sentiment::Negative, SubstantiationType::None),
		claim("R1-C2", "Writing", Sentiment::Neutral, SubstantiationType::None),
		claim("orphan", "Writing", Sentiment::Neutral, SubstantiationType::None),
	];
	let records = vec![record("R1-C1", VerificationResult::False)];
	let cfg = Weighting { alpha: 1.0, beta: 1.0 };
	let forward = credibility::compute_weights(&claims, &records, &cfg);

	claims.reverse();

	let backward = credibility::compute_weights(&claims, &records, &cfg);

	assert_eq!(forward, backward);
	assert_eq!(forward.len(), 2);
	assert!(forward.values().all(|weight| (0.0..=1.0).contains(&weight.weight)));
	assert_eq!(forward["R1"].weight, 0.0);
}

#[test]
fn no_claims_means_no_weights() {
	assert!(credibility::compute_weights(&[], &[], &Weighting::default()).is_empty());
}

#[test]
fn claim_verified_false_is_excluded_from_the_vote() {
	let claims = vec![
		Claim {
			statement: "accuracy improved 5%".to_string(),
			..claim(
				"R1-C1",
				"Experiments",
				Sentiment::Positive,
				SubstantiationType::SpecificCitation,
			)
		},
		claim("R2-C1", "Experiments", Sentiment::Negative, SubstantiationType::Vague),
	];
	let records = vec![
		record("R1-C1", VerificationResult::False),
		record("R2-C1", VerificationResult::True),
	];
	let weights = credibility::compute_weights(&claims, &records, &Weighting::default());
	let result = synthesis::synthesize(&claims, &records, &weights, &Synthesis::default());
	let experiments = &result.topics[1];

	assert_eq!(experiments.topic, "Experiments");
	assert_eq!(experiments.claim_count, 1);
	assert_eq!(experiments.claims[0].claim_id, "R2-C1");
	assert_eq!(experiments.decision, Decision::Reject);
	assert_eq!(claims.len(), 2);
}

#[test]
fn novelty_vote_hits_the_accept_boundary() {
	let claims = vec![
		claim("R1-C1", "Novelty", Sentiment::Positive, SubstantiationType::Vague),
		claim("R2-C1", "novelty", Sentiment::Negative, SubstantiationType::Vague),
	];
	let weights: ReviewerWeights = [("R1", 0.8), ("R2", 0.2)]
		.into_iter()
		.map(|(reviewer, weight)| {
			(
				reviewer.to_string(),
				credibility::ReviewerWeight {
					weight,
					hollowness: 0.0,
					hallucination: 0.0,
					claim_count: 1,
					evidenced_claim_count: 1,
					false_claim_count: 0,
				},
			)
		})
		.collect();
	let result = synthesis::synthesize(&claims, &[], &weights, &Synthesis::default());
	let novelty = &result.topics[0];

	assert!((novelty.score - 0.6).abs() < 1e-9);
	assert_eq!(novelty.decision, Decision::Accept);
	assert_eq!(result.overall.topics_with_claims, 1);
	assert_eq!(result.overall.decision, Decision::Accept);
}

#[test]
fn zero_weights_make_every_topic_neutral() {
	let claims = vec![
		claim("R1-C1", "Novelty", Sentiment::Positive, SubstantiationType::Vague),
		claim("R1-C2", "Writing", Sentiment::Negative, SubstantiationType::None),
	];
	let result =
		synthesis::synthesize(&claims, &[], &ReviewerWeights::new(), &Synthesis::default());

	assert_eq!(result.topics.len(), 5);
	assert!(result.topics.iter().all(|topic| topic.score == 0.0));
	assert!(result.topics.iter().all(|topic| topic.decision == Decision::Neutral));
	assert_eq!(result.overall.score, 0.0);
	assert_eq!(result.overall.decision, Decision::Neutral);
}
