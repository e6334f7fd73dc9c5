use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

use evw_config::LlmProviderConfig;
use evw_domain::claim::VerificationResult;

const SYSTEM_PROMPT: &str = "You are a fact-checking expert for academic papers. Your task is \
to verify whether a reviewer's claim about a paper is consistent with the actual content of the \
paper.

For each claim, you need to determine:
1. verification_result: One of \"True\", \"False\", or \"Partially_True\"
   - True: The claim is fully supported by the paper
   - False: The claim contradicts or is not supported by the paper
   - Partially_True: The claim is partially correct but has some inaccuracies
2. verification_reason: A clear explanation of why you reached this conclusion, citing specific \
evidence from the paper
3. confidence: A confidence score between 0.0 and 1.0

You must base your judgment solely on the evidence provided from the paper. Be objective and \
precise.";
const DEFAULT_REASON: &str = "Unable to determine";
const DEFAULT_CONFIDENCE: f64 = 0.5;

#[derive(Clone, Debug, PartialEq)]
pub struct Verdict {
	pub result: VerificationResult,
	pub reason: String,
	pub confidence: f64,
}

/// Parsed oracle output. Nothing past this adapter sees raw model text.
#[derive(Clone, Debug, PartialEq)]
pub enum JudgeOutcome {
	Verdict(Verdict),
	Malformed { reason: String },
}

pub fn build_messages(statement: &str, substantiation: &str, context: &str) -> Vec<Value> {
	let prompt = format!(
		"Please verify the following reviewer claim against the paper content.

Reviewer Claim:
Statement: {statement}
Substantiation: {substantiation}

Relevant Paper Context:
{context}

Please provide your verification result in the following JSON format:
{{
    \"verification_result\": \"True\" | \"False\" | \"Partially_True\",
    \"verification_reason\": \"Your detailed explanation here, citing specific evidence from the paper context\",
    \"confidence\": 0.0-1.0
}}"
	);

	vec![
		serde_json::json!({ "role": "system", "content": SYSTEM_PROMPT }),
		serde_json::json!({ "role": "user", "content": prompt }),
	]
}

pub async fn complete(cfg: &LlmProviderConfig, messages: &[Value]) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"max_tokens": cfg.max_tokens,
		"messages": messages,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_completion(&json)
}

pub fn parse_outcome(content: &str) -> JudgeOutcome {
	let payload = strip_code_fence(content);
	let json: Value = match serde_json::from_str(payload) {
		Ok(json) => json,
		Err(err) => {
			return JudgeOutcome::Malformed {
				reason: format!("Error parsing verification result: {err}"),
			};
		},
	};
	let Some(object) = json.as_object() else {
		return JudgeOutcome::Malformed {
			reason: "Error parsing verification result: expected a JSON object".to_string(),
		};
	};
	let result = object
		.get("verification_result")
		.and_then(Value::as_str)
		.and_then(VerificationResult::parse)
		.unwrap_or(VerificationResult::PartiallyTrue);
	let reason = object
		.get("verification_reason")
		.and_then(Value::as_str)
		.unwrap_or(DEFAULT_REASON)
		.to_string();
	let confidence = match object.get("confidence") {
		None | Some(Value::Null) => DEFAULT_CONFIDENCE,
		Some(value) => {
			let parsed = value
				.as_f64()
				.or_else(|| value.as_str().and_then(|raw| raw.trim().parse::<f64>().ok()));

			match parsed {
				Some(number) if number.is_finite() => number.clamp(0.0, 1.0),
				_ => {
					return JudgeOutcome::Malformed {
						reason: format!("Error during verification: invalid confidence {value}"),
					};
				},
			}
		},
	};

	JudgeOutcome::Verdict(Verdict { result, reason, confidence })
}

fn parse_completion(json: &Value) -> Result<String> {
	json.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.map(str::to_string)
		.ok_or_else(|| eyre::eyre!("Judge response is missing message content."))
}

fn strip_code_fence(content: &str) -> &str {
	let inner = if let Some((_, rest)) = content.split_once("```json") {
		rest.split("```").next().unwrap_or(rest)
	} else if let Some((_, rest)) = content.split_once("```") {
		rest.split("```").next().unwrap_or(rest)
	} else {
		content
	};

	inner.trim()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn strips_json_fence() {
		let raw = "Here you go:\n```json\n{\"verification_result\": \"True\"}\n```\nDone.";

		assert_eq!(strip_code_fence(raw), "{\"verification_result\": \"True\"}");
	}

	#[test]
	fn strips_bare_fence() {
		assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
		assert_eq!(strip_code_fence("  {}  "), "{}");
	}

	#[test]
	fn reads_choice_content() {
		let json = serde_json::json!({
			"choices": [{ "message": { "content": "{\"confidence\": 0.4}" } }]
		});

		assert_eq!(
			parse_completion(&json).expect("Failed to read completion."),
			"{\"confidence\": 0.4}"
		);
		assert!(parse_completion(&serde_json::json!({ "choices": [] })).is_err());
	}

	#[test]
	fn prompt_carries_claim_and_context() {
		let messages = build_messages("Accuracy is 90%.", "Table 2", "We report 90% accuracy.");
		let user = messages[1]["content"].as_str().expect("User content must be a string.");

		assert_eq!(messages[0]["role"], "system");
		assert!(user.contains("Statement: Accuracy is 90%."));
		assert!(user.contains("Substantiation: Table 2"));
		assert!(user.contains("We report 90% accuracy."));
	}
}
