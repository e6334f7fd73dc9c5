use std::fs;

use evw_chunking::Section;
use evw_domain::{
	claim::{VerificationRecord, VerificationResult},
	credibility::ReviewerWeight,
};
use evw_storage::{
	Error,
	artifacts::ArtifactLayout,
	documents::{DocumentSource, FsDocumentSource},
};
use evw_testkit::TempDir;

fn write(path: &std::path::Path, contents: &str) {
	fs::create_dir_all(path.parent().expect("Artifact path has a parent."))
		.expect("Failed to create artifact dir.");
	fs::write(path, contents).expect("Failed to write artifact.");
}

#[test]
fn layout_matches_artifact_tree() {
	let layout = ArtifactLayout::new("data");

	assert_eq!(layout.paper_text("p1"), std::path::Path::new("data/processed/papers/p1.txt"));
	assert_eq!(
		layout.paper_sections("p1"),
		std::path::Path::new("data/processed/papers/p1_sections.json")
	);
	assert_eq!(
		layout.claims("p1"),
		std::path::Path::new("data/processed/extracted/p1_claims.json")
	);
	assert_eq!(
		layout.verifications("p1"),
		std::path::Path::new("data/results/verifications/p1_verified.json")
	);
	assert_eq!(layout.weights("p1"), std::path::Path::new("data/results/weights/p1_weights.json"));
	assert_eq!(layout.report("p1"), std::path::Path::new("data/results/synthesis/p1_report.md"));
}

#[test]
fn missing_artifacts_load_as_none() {
	let dir = TempDir::new("evw-storage").expect("Failed to create temp dir.");
	let layout = ArtifactLayout::new(dir.path());

	assert!(layout.load_claims("absent").expect("Failed to probe claims.").is_none());
	assert!(layout.load_verifications("absent").expect("Failed to probe records.").is_none());
	assert!(layout.load_weights("absent").expect("Failed to probe weights.").is_none());
}

#[test]
fn verification_records_accept_both_shapes_and_aliases() {
	let dir = TempDir::new("evw-storage").expect("Failed to create temp dir.");
	let layout = ArtifactLayout::new(dir.path());

	write(
		&layout.verifications("listed"),
		r#"[{"id": "R1-C1", "verification_result": "False", "verification_reason": "No.", "confidence": 0.9}]"#,
	);
	write(
		&layout.verifications("keyed"),
		r#"{"R2-C1": {"claim_id": "R2-C1", "result": "Mostly true"}}"#,
	);

	let listed = layout.load_verifications("listed").expect("Failed to load.").expect("Missing.");
	let keyed = layout.load_verifications("keyed").expect("Failed to load.").expect("Missing.");

	assert_eq!(listed[0].result, VerificationResult::False);
	assert_eq!(listed[0].reason, "No.");
	assert_eq!(keyed[0].id, "R2-C1");
	assert_eq!(keyed[0].result, VerificationResult::PartiallyTrue);
	assert_eq!(keyed[0].confidence, 0.5);
}

#[test]
fn records_round_trip_under_canonical_names() {
	let dir = TempDir::new("evw-storage").expect("Failed to create temp dir.");
	let layout = ArtifactLayout::new(dir.path());
	let records = vec![VerificationRecord {
		id: "R1-C2".to_string(),
		result: VerificationResult::True,
		reason: "Table 2 supports it.".to_string(),
		confidence: 0.8,
	}];
	let path = layout.save_verifications("doc", &records).expect("Failed to save records.");
	let raw = fs::read_to_string(path).expect("Failed to read records.");

	assert!(raw.contains("\"verification_result\": \"True\""));
	assert_eq!(
		layout.load_verifications("doc").expect("Failed to load.").as_deref(),
		Some(&records[..])
	);
}

#[test]
fn weights_accept_original_key_names() {
	let dir = TempDir::new("evw-storage").expect("Failed to create temp dir.");
	let layout = ArtifactLayout::new(dir.path());

	write(
		&layout.weights("doc"),
		r#"{"R1": {"weight": 0.5, "hollowness": 1.0, "hallucination": 0.0,
		"num_claims": 4, "num_claims_with_evidence": 0, "num_false_claims": 0}}"#,
	);

	let weights = layout.load_weights("doc").expect("Failed to load.").expect("Missing.");

	assert_eq!(
		weights.get("R1"),
		Some(&ReviewerWeight {
			weight: 0.5,
			hollowness: 1.0,
			hallucination: 0.0,
			claim_count: 4,
			evidenced_claim_count: 0,
			false_claim_count: 0,
		})
	);
}

#[test]
fn document_source_reads_text_and_ordered_sections() {
	let dir = TempDir::new("evw-storage").expect("Failed to create temp dir.");
	let layout = ArtifactLayout::new(dir.path());

	write(&layout.paper_text("doc"), "Abstract text.\n\nMethod text.");
	write(
		&layout.paper_sections("doc"),
		r#"[{"name": "Method", "text": "Method text."}, {"name": "Abstract", "text": "Abstract text."}]"#,
	);

	let source = FsDocumentSource::new(layout);
	let sections = source.sections("doc").expect("Failed to read sections.");

	assert_eq!(
		source.text("doc").expect("Failed to read text."),
		"Abstract text.\n\nMethod text."
	);
	assert_eq!(
		sections,
		vec![
			Section { name: "Method".to_string(), text: "Method text.".to_string() },
			Section { name: "Abstract".to_string(), text: "Abstract text.".to_string() },
		]
	);
}

#[test]
fn missing_text_is_not_found_and_missing_sections_are_empty() {
	let dir = TempDir::new("evw-storage").expect("Failed to create temp dir.");
	let source = FsDocumentSource::new(ArtifactLayout::new(dir.path()));

	assert!(matches!(source.text("ghost"), Err(Error::NotFound(_))));
	assert!(source.sections("ghost").expect("Failed to read sections.").is_empty());
}
