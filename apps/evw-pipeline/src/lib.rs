use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use evw_service::EvwService;

#[derive(Debug, Parser)]
#[command(
	version = evw_cli::VERSION,
	rename_all = "kebab",
	styles = evw_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Verify every evidenced claim of a document against its text.
	Verify(DocArgs),
	/// Recompute reviewer credibility weights from stored verification records.
	Weight(DocArgs),
	/// Run the weighted topic vote and write the meta-review report.
	Synthesize(DocArgs),
	/// Verify, weight and synthesize in sequence.
	Run(DocArgs),
	/// Build or refresh the semantic index of a document.
	Index(DocArgs),
}
impl Command {
	fn doc_id(&self) -> &str {
		match self {
			Self::Verify(args)
			| Self::Weight(args)
			| Self::Synthesize(args)
			| Self::Run(args)
			| Self::Index(args) => &args.doc,
		}
	}
}

#[derive(Debug, clap::Args)]
pub struct DocArgs {
	#[arg(long, value_name = "ID")]
	pub doc: String,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = evw_config::load(&args.config)?;
	let filter = EnvFilter::new(config.service.log_level.clone());

	tracing_subscriber::fmt().with_env_filter(filter).init();

	let service = EvwService::new(config);
	let doc_id = args.command.doc_id();

	tracing::info!(doc_id, command = ?args.command, "Starting pipeline step.");

	match &args.command {
		Command::Verify(_) => print_json(&service.verify(doc_id).await?),
		Command::Weight(_) => print_json(&service.weight(doc_id)?),
		Command::Synthesize(_) => {
			let Some(synthesis) = service.synthesize(doc_id)? else {
				tracing::warn!(doc_id, "Nothing to synthesize.");

				return Ok(());
			};

			println!("{}", synthesis.report);

			Ok(())
		},
		Command::Run(_) => print_json(&service.run(doc_id).await?),
		Command::Index(_) => print_json(&service.index(doc_id).await?),
	}
}

fn print_json<T: Serialize>(value: &T) -> color_eyre::Result<()> {
	let json = serde_json::to_string_pretty(value)?;

	println!("{json}");

	Ok(())
}
