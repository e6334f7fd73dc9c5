use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(from = "Option<String>")]
pub enum Sentiment {
	Positive,
	Negative,
	#[default]
	Neutral,
}
impl Sentiment {
	pub fn score(self) -> f64 {
		match self {
			Self::Positive => 1.0,
			Self::Negative => -1.0,
			Self::Neutral => 0.0,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Positive => "Positive",
			Self::Negative => "Negative",
			Self::Neutral => "Neutral",
		}
	}
}
impl From<Option<String>> for Sentiment {
	fn from(raw: Option<String>) -> Self {
		let Some(raw) = raw else {
			return Self::Neutral;
		};
		let lowered = raw.to_lowercase();

		if lowered.contains("positive") {
			Self::Positive
		} else if lowered.contains("negative") {
			Self::Negative
		} else {
			Self::Neutral
		}
	}
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(from = "Option<String>")]
pub enum SubstantiationType {
	#[serde(rename = "Specific_Citation")]
	SpecificCitation,
	Vague,
	#[default]
	None,
}
impl From<Option<String>> for SubstantiationType {
	fn from(raw: Option<String>) -> Self {
		let Some(raw) = raw else {
			return Self::None;
		};
		let trimmed = raw.trim();

		if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
			Self::None
		} else if trimmed.eq_ignore_ascii_case("specific_citation") {
			Self::SpecificCitation
		} else {
			// Any other non-empty label still marks the claim as carrying evidence.
			Self::Vague
		}
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Claim {
	pub id: String,
	#[serde(default)]
	pub topic: String,
	#[serde(default)]
	pub sentiment: Sentiment,
	#[serde(default)]
	pub statement: String,
	#[serde(default)]
	pub substantiation_type: SubstantiationType,
	#[serde(default)]
	pub substantiation_content: Option<String>,
}
impl Claim {
	/// The reviewer owning this claim: the id prefix before the first `-`.
	pub fn reviewer_id(&self) -> Option<&str> {
		reviewer_id(&self.id)
	}

	pub fn has_evidence(&self) -> bool {
		self.substantiation_type != SubstantiationType::None
	}

	pub fn substantiation(&self) -> &str {
		self.substantiation_content.as_deref().unwrap_or_default()
	}

	pub fn query(&self) -> String {
		let substantiation = self.substantiation();

		if substantiation.is_empty() {
			self.statement.clone()
		} else {
			format!("{} {substantiation}", self.statement)
		}
	}
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(from = "String")]
pub enum VerificationResult {
	True,
	False,
	#[serde(rename = "Partially_True")]
	PartiallyTrue,
}
impl VerificationResult {
	/// Strict parse. Unknown labels yield `None`.
	pub fn parse(raw: &str) -> Option<Self> {
		match raw.trim() {
			"True" => Some(Self::True),
			"False" => Some(Self::False),
			"Partially_True" => Some(Self::PartiallyTrue),
			_ => None,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::True => "True",
			Self::False => "False",
			Self::PartiallyTrue => "Partially_True",
		}
	}
}
impl From<String> for VerificationResult {
	fn from(raw: String) -> Self {
		Self::parse(&raw).unwrap_or(Self::PartiallyTrue)
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct VerificationRecord {
	#[serde(alias = "claim_id")]
	pub id: String,
	#[serde(rename = "verification_result", alias = "result")]
	pub result: VerificationResult,
	#[serde(rename = "verification_reason", alias = "reason", default)]
	pub reason: String,
	#[serde(default = "default_confidence")]
	pub confidence: f64,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct VerificationSummary {
	pub total: usize,
	pub true_count: usize,
	pub false_count: usize,
	pub partial_count: usize,
}
impl VerificationSummary {
	pub fn tally(records: &[VerificationRecord]) -> Self {
		let mut summary = Self { total: records.len(), ..Self::default() };

		for record in records {
			match record.result {
				VerificationResult::True => summary.true_count += 1,
				VerificationResult::False => summary.false_count += 1,
				VerificationResult::PartiallyTrue => summary.partial_count += 1,
			}
		}

		summary
	}
}

pub fn reviewer_id(claim_id: &str) -> Option<&str> {
	let (reviewer, _) = claim_id.split_once('-')?;

	if reviewer.is_empty() { None } else { Some(reviewer) }
}

/// Maps claim id to verification result. Later records win over earlier ones.
pub fn results_by_claim(records: &[VerificationRecord]) -> HashMap<&str, VerificationResult> {
	records.iter().map(|record| (record.id.as_str(), record.result)).collect()
}

fn default_confidence() -> f64 {
	0.5
}
