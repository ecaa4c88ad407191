use clap::Parser;

use cover_match::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = Args::parse();

	cover_match::run(args).await
}
