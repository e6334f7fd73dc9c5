use reqwest::header::AUTHORIZATION;
use serde_json::{Map, Value};

use evw_domain::claim::VerificationResult;
use evw_providers::judge::{self, JudgeOutcome, Verdict};

#[test]
fn builds_bearer_auth_header() {
	let headers =
		evw_providers::auth_headers("secret", &Map::new()).expect("Failed to build headers.");
	let value = headers.get(AUTHORIZATION).expect("Missing authorization header.");

	assert_eq!(value, "Bearer secret");
}

#[test]
fn rejects_non_string_default_headers() {
	let mut defaults = Map::new();

	defaults.insert("x-trace".to_string(), Value::Bool(true));

	assert!(evw_providers::auth_headers("secret", &defaults).is_err());
}

#[test]
fn fenced_verdict_is_parsed() {
	let raw = "```json\n{\"verification_result\": \"False\", \"verification_reason\": \"Table 2 \
	           shows 70%.\", \"confidence\": 0.85}\n```";

	assert_eq!(
		judge::parse_outcome(raw),
		JudgeOutcome::Verdict(Verdict {
			result: VerificationResult::False,
			reason: "Table 2 shows 70%.".to_string(),
			confidence: 0.85,
		})
	);
}

#[test]
fn missing_fields_fall_back_to_defaults() {
	let JudgeOutcome::Verdict(verdict) = judge::parse_outcome("{}") else {
		panic!("Expected a verdict.");
	};

	assert_eq!(verdict.result, VerificationResult::PartiallyTrue);
	assert_eq!(verdict.reason, "Unable to determine");
	assert_eq!(verdict.confidence, 0.5);
}

#[test]
fn unknown_label_normalizes_and_confidence_clamps() {
	let JudgeOutcome::Verdict(verdict) =
		judge::parse_outcome(r#"{"verification_result": "Mostly", "confidence": "1.7"}"#)
	else {
		panic!("Expected a verdict.");
	};

	assert_eq!(verdict.result, VerificationResult::PartiallyTrue);
	assert_eq!(verdict.confidence, 1.0);
}

#[test]
fn non_json_output_is_malformed() {
	let outcome = judge::parse_outcome("I think the claim is true.");

	assert!(matches!(
		outcome,
		JudgeOutcome::Malformed { ref reason } if reason.contains("parsing")
	));
	assert!(matches!(judge::parse_outcome("[1, 2]"), JudgeOutcome::Malformed { .. }));
	assert!(matches!(
		judge::parse_outcome(r#"{"confidence": "high"}"#),
		JudgeOutcome::Malformed { .. }
	));
}
