use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use evw_config::{ChunkStrategy, Config, Error, RetrievalStrategy};

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn sample_toml_with(section: &str, key: &str, value: Value) -> String {
	let mut root: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");
	let mut table = root.as_table_mut().expect("Template config must be a table.");

	for part in section.split('.') {
		table = table
			.get_mut(part)
			.and_then(Value::as_table_mut)
			.unwrap_or_else(|| panic!("Template config must include [{section}]."));
	}

	table.insert(key.to_string(), value);

	toml::to_string(&root).expect("Failed to render template config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("evw_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_payload(payload: String) -> evw_config::Result<Config> {
	let path = write_temp_config(payload);
	let result = evw_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

fn base_config() -> Config {
	toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse test config.")
}

#[test]
fn sample_config_loads() {
	let cfg =
		load_payload(SAMPLE_CONFIG_TEMPLATE_TOML.to_string()).expect("Expected valid config.");

	assert_eq!(cfg.retrieval.strategy, RetrievalStrategy::Hybrid);
	assert_eq!(cfg.chunking.strategy, ChunkStrategy::Paragraph);
	assert!(cfg.retrieval.rerank.enabled);
	assert_eq!(cfg.synthesis.topics.len(), 5);
	assert_eq!(cfg.providers.judge.max_tokens, 1_000);
}

#[test]
fn empty_file_is_rejected() {
	let err = load_payload("   \n".to_string()).expect_err("Expected empty config error.");

	assert!(matches!(err, Error::EmptyConfig { .. }), "Unexpected error: {err}");
}

#[test]
fn overlap_must_be_less_than_chunk_size() {
	let payload = sample_toml_with("chunking", "chunk_overlap", Value::Integer(500));
	let err = load_payload(payload).expect_err("Expected overlap validation error.");

	assert!(
		err.to_string().contains("chunking.chunk_overlap must be less than chunking.chunk_size."),
		"Unexpected error: {err}"
	);
}

#[test]
fn alpha_must_be_in_unit_range() {
	let payload = sample_toml_with("weighting", "alpha", Value::Float(1.5));
	let err = load_payload(payload).expect_err("Expected alpha validation error.");

	assert!(
		err.to_string().contains("weighting.alpha must be in the range 0.0-1.0."),
		"Unexpected error: {err}"
	);
}

#[test]
fn dual_discovery_bonus_cannot_shrink_scores() {
	let payload =
		sample_toml_with("retrieval.hybrid", "dual_discovery_bonus", Value::Float(0.9));
	let err = load_payload(payload).expect_err("Expected bonus validation error.");

	assert!(err.to_string().contains("dual_discovery_bonus"), "Unexpected error: {err}");
}

#[test]
fn semantic_strategy_requires_embedding_provider() {
	let mut cfg = base_config();

	cfg.retrieval.strategy = RetrievalStrategy::Semantic;
	cfg.providers.embedding = None;

	let err = evw_config::validate(&cfg).expect_err("Expected missing provider error.");

	assert!(
		err.to_string().contains("providers.embedding is required"),
		"Unexpected error: {err}"
	);
}

#[test]
fn hybrid_strategy_tolerates_missing_embedding_provider() {
	let mut cfg = base_config();

	cfg.retrieval.strategy = RetrievalStrategy::Hybrid;
	cfg.providers.embedding = None;

	assert!(evw_config::validate(&cfg).is_ok());
}

#[test]
fn rerank_key_is_ignored_when_rerank_is_disabled() {
	let mut cfg = base_config();

	cfg.retrieval.rerank.enabled = false;

	if let Some(rerank) = cfg.providers.rerank.as_mut() {
		rerank.api_key = " ".to_string();
	}

	assert!(evw_config::validate(&cfg).is_ok());

	cfg.retrieval.rerank.enabled = true;

	let err = evw_config::validate(&cfg).expect_err("Expected api key validation error.");

	assert!(
		err.to_string().contains("Provider rerank api_key must be non-empty."),
		"Unexpected error: {err}"
	);
}

#[test]
fn omitted_sections_fall_back_to_defaults() {
	let payload = r#"
[service]
log_level = "debug"

[storage]
data_dir = "data"

[providers.judge]
provider_id = "p"
api_base    = "http://localhost"
api_key     = "key"
path        = "/chat/completions"
model       = "m"
temperature = 0.1
timeout_ms  = 1000
"#;
	let cfg = load_payload(payload.to_string()).expect("Expected valid minimal config.");

	assert_eq!(cfg.retrieval.strategy, RetrievalStrategy::Lexical);
	assert_eq!(cfg.chunking.max_segments, 1_000);
	assert_eq!(cfg.verification.max_context_chars, 3_000);
	assert!((cfg.weighting.alpha - 0.5).abs() < f64::EPSILON);
	assert!((cfg.synthesis.accept_threshold - 0.6).abs() < f64::EPSILON);
	assert!((cfg.retrieval.hybrid.dual_discovery_bonus - 1.1).abs() < f32::EPSILON);
}
