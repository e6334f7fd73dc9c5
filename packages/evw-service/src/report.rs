use evw_domain::{
	claim::VerificationSummary,
	credibility::ReviewerWeights,
	scoring::VerificationScore,
	synthesis::{Decision, SynthesisResult},
};

const WIDTH: usize = 70;
const KEY_CLAIMS: usize = 3;
const STATEMENT_PREVIEW_CHARS: usize = 80;

/// Renders the plain-text meta-review report.
pub fn render(
	doc_id: &str,
	weights: &ReviewerWeights,
	synthesis: &SynthesisResult,
	summary: &VerificationSummary,
	score: &VerificationScore,
) -> String {
	let heavy = "=".repeat(WIDTH);
	let mut out = String::new();

	line(&mut out, &heavy);
	line(&mut out, &format!("Meta-Review Report for Paper: {doc_id}"));
	line(&mut out, &heavy);
	line(&mut out, "");
	line(&mut out, "This report is generated using the E-V-W Evaluation Stack.");
	line(&mut out, "The evaluation process includes:");
	line(&mut out, "  1. Structure Extraction: Claims extracted from reviews");
	line(&mut out, "  2. Fact Verification: Claims verified against paper content");
	line(&mut out, "  3. Bias Calculation: Reviewer credibility weights calculated");
	line(&mut out, "  4. Meta-Review Synthesis: Weighted voting on topics");
	line(&mut out, "");

	heading(&mut out, "REVIEWER CREDIBILITY WEIGHTS");

	let mut ranked: Vec<_> = weights.iter().collect();

	// Stable, so equal weights keep reviewer id order.
	ranked.sort_by(|a, b| b.1.weight.total_cmp(&a.1.weight));

	for (reviewer, weight) in ranked {
		let unevidenced = weight.claim_count.saturating_sub(weight.evidenced_claim_count);

		line(&mut out, &format!("{reviewer}:"));
		line(&mut out, &format!("  Weight: {:.3}", weight.weight));
		line(
			&mut out,
			&format!(
				"  Hollowness: {:.3} ({unevidenced}/{} claims without evidence)",
				weight.hollowness, weight.claim_count
			),
		);
		line(
			&mut out,
			&format!(
				"  Hallucination: {:.3} ({}/{} false claims)",
				weight.hallucination, weight.false_claim_count, weight.evidenced_claim_count
			),
		);
		line(&mut out, "");
	}

	heading(&mut out, "VERIFICATION SUMMARY");

	line(
		&mut out,
		&format!(
			"Verified claims: {} (True={}, False={}, Partially_True={})",
			summary.total, summary.true_count, summary.false_count, summary.partial_count
		),
	);
	line(
		&mut out,
		&format!(
			"Credibility-Weighted Verification Score: {:.3} (predicted: {})",
			score.score,
			score.decision.as_str()
		),
	);
	line(&mut out, "");

	heading(&mut out, "TOPIC-BASED EVALUATION");

	for topic in &synthesis.topics {
		line(&mut out, &format!("Topic: {}", topic.topic));
		line(&mut out, &format!("  Score: {:.3}", topic.score));
		line(&mut out, &format!("  Decision: {}", topic.decision.as_str()));
		line(&mut out, &format!("  Number of claims: {}", topic.claim_count));

		if !topic.claims.is_empty() {
			line(&mut out, "  Key claims:");

			for claim in topic.claims.iter().take(KEY_CLAIMS) {
				let preview: String =
					claim.statement.chars().take(STATEMENT_PREVIEW_CHARS).collect();

				line(
					&mut out,
					&format!(
						"    - [{}] {}: {preview}... (contribution: {:+.3})",
						claim.reviewer_id.as_deref().unwrap_or("unknown"),
						claim.sentiment.as_str(),
						claim.contribution
					),
				);
			}
		}

		line(&mut out, "");
	}

	heading(&mut out, "OVERALL ASSESSMENT");

	let overall = &synthesis.overall;

	if overall.topics_with_claims > 0 {
		line(&mut out, &format!("Average Topic Score: {:.3}", overall.score));
		line(
			&mut out,
			&format!(
				"Topic Decisions: Accept={}, Reject={}, Neutral={}",
				overall.accept_count, overall.reject_count, overall.neutral_count
			),
		);
		line(&mut out, &format!("Overall Recommendation: {}", recommendation(overall.decision)));
	}

	line(&mut out, "");
	line(&mut out, &heavy);
	line(&mut out, "End of Report");
	out.push_str(&heavy);

	out
}

fn recommendation(decision: Decision) -> &'static str {
	match decision {
		Decision::Accept => "ACCEPT",
		Decision::Reject => "REJECT",
		Decision::Neutral => "NEUTRAL / REVISE",
	}
}

fn heading(out: &mut String, title: &str) {
	let light = "-".repeat(WIDTH);

	line(out, &light);
	line(out, title);
	line(out, &light);
	line(out, "");
}

fn line(out: &mut String, text: &str) {
	out.push_str(text);
	out.push('\n');
}
