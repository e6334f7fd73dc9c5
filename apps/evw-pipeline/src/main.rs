// crates.io
use clap::Parser;
// self
use evw_pipeline::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = Args::parse();

	evw_pipeline::run(args).await
}
