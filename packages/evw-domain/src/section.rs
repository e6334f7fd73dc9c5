use crate::claim::Claim;

const TOPIC_SECTIONS: &[(&str, &str)] = &[
	("experiments", "experiments"),
	("experimental", "experiments"),
	("methodology", "methodology"),
	("method", "method"),
	("results", "results"),
	("result", "results"),
];
const METHOD_KEYWORDS: &[&str] =
	&["method", "methodology", "approach", "algorithm", "model", "architecture", "design"];
const SECTION_KEYWORDS: &[(&str, &[&str])] = &[
	(
		"experiments",
		&["experiment", "experimental", "evaluation", "dataset", "baseline", "metric", "result"],
	),
	("results", &["result", "finding", "performance", "accuracy", "score", "improvement"]),
	("methodology", METHOD_KEYWORDS),
	("method", METHOD_KEYWORDS),
	("introduction", &["introduction", "motivation", "background", "problem"]),
	("related work", &["related work", "related", "previous", "prior work", "literature"]),
	("discussion", &["discussion", "analysis", "interpretation", "implication"]),
	("conclusion", &["conclusion", "summary", "future work"]),
];

/// Fuzzy section-name match: either lowercase name contains the other.
pub fn section_matches(name: &str, wanted: &str) -> bool {
	let name = name.to_lowercase();
	let wanted = wanted.to_lowercase();

	name.contains(&wanted) || wanted.contains(&name)
}

/// Picks the document section most likely to hold evidence for `claim`.
///
/// Returns `None` when nothing in the claim points at a section, meaning the whole document
/// should be searched. A keyword match with no corresponding available section yields the
/// canonical section key so the retrievers can still attempt a fuzzy match.
pub fn identify_section(claim: &Claim, available_sections: &[String]) -> Option<String> {
	let topic = claim.topic.to_lowercase();

	if !topic.is_empty()
		&& let Some((_, canonical)) = TOPIC_SECTIONS.iter().find(|(key, _)| topic.contains(key))
		&& let Some(found) = find_available(canonical, available_sections)
	{
		return Some(found.to_string());
	}

	let haystack =
		format!("{} {} {}", claim.statement, claim.substantiation(), claim.topic).to_lowercase();
	let mut best: Option<(&str, usize)> = None;

	for (section, keywords) in SECTION_KEYWORDS {
		let hits = keywords.iter().filter(|keyword| haystack.contains(*keyword)).count();

		if hits > best.map(|(_, score)| score).unwrap_or(0) {
			best = Some((*section, hits));
		}
	}

	let (canonical, _) = best?;

	Some(find_available(canonical, available_sections).unwrap_or(canonical).to_string())
}

fn find_available<'a>(canonical: &str, available_sections: &'a [String]) -> Option<&'a str> {
	available_sections
		.iter()
		.find(|name| section_matches(name, canonical))
		.map(String::as_str)
}

#[cfg(test)]
mod tests {
	use crate::claim::{Sentiment, SubstantiationType};

	use super::*;

	fn claim(topic: &str, statement: &str, substantiation: &str) -> Claim {
		Claim {
			id: "R1-C1".to_string(),
			topic: topic.to_string(),
			sentiment: Sentiment::Neutral,
			statement: statement.to_string(),
			substantiation_type: SubstantiationType::Vague,
			substantiation_content: Some(substantiation.to_string()),
		}
	}

	fn sections(names: &[&str]) -> Vec<String> {
		names.iter().map(|name| name.to_string()).collect()
	}

	#[test]
	fn topic_table_prefers_available_section() {
		let available = sections(&["1 Introduction", "4 Experiments and Analysis"]);
		let found = identify_section(&claim("Experiments", "nothing", ""), &available);

		assert_eq!(found.as_deref(), Some("4 Experiments and Analysis"));
	}

	#[test]
	fn keyword_scoring_picks_highest_group() {
		let available = sections(&["Introduction", "Related Work", "Conclusion"]);
		let found = identify_section(
			&claim("Novelty", "Prior work in the literature already covers this.", ""),
			&available,
		);

		assert_eq!(found.as_deref(), Some("Related Work"));
	}

	#[test]
	fn ties_go_to_the_first_group() {
		// "result" scores one hit for both experiments and results.
		let found = identify_section(&claim("Writing", "The result is unclear.", ""), &[]);

		assert_eq!(found.as_deref(), Some("experiments"));
	}

	#[test]
	fn unmatched_keyword_returns_canonical_key() {
		let available = sections(&["Background"]);
		let found =
			identify_section(&claim("Clarity", "The conclusion overreaches.", ""), &available);

		assert_eq!(found.as_deref(), Some("conclusion"));
	}

	#[test]
	fn no_keywords_means_whole_document() {
		let found = identify_section(&claim("Clarity", "Typos everywhere.", ""), &sections(&["A"]));

		assert_eq!(found, None);
	}

	#[test]
	fn fuzzy_match_is_symmetric_and_case_insensitive() {
		assert!(section_matches("3 Method", "method"));
		assert!(section_matches("method", "3 METHOD"));
		assert!(!section_matches("Results", "method"));
	}
}
