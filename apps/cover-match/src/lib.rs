use std::{
	fs,
	path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};
use color_eyre::eyre;
use serde_json::{Value, json};
use time::{Date, OffsetDateTime, macros::format_description};
use tracing_subscriber::EnvFilter;

use cover_config::Config;
use cover_domain::{BuyerCharacteristics, BuyerProfile};
use cover_service::{FindProductsRequest, MatchingService};

#[derive(Debug, Parser)]
#[command(
	version = cover_cli::VERSION,
	rename_all = "kebab",
	styles = cover_cli::styles(),
)]
pub struct Args {
	/// Required by every command that talks to the search engine.
	#[arg(long, short = 'c', value_name = "FILE", global = true)]
	pub config: Option<PathBuf>,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
#[command(rename_all = "kebab")]
pub enum Command {
	/// Report search engine cluster health. Exits with an error when unhealthy.
	Health,
	/// Recommend products for buyer characteristics read from a JSON file.
	Match {
		#[arg(long, value_name = "FILE")]
		characteristics: PathBuf,
		#[arg(long, value_name = "N")]
		limit: Option<u32>,
	},
	/// Derive buyer characteristics from a structured profile JSON file.
	Analyze {
		#[arg(long, value_name = "FILE")]
		profile: PathBuf,
		/// Reference date for the age calculation. Defaults to the current UTC date.
		#[arg(long, value_name = "YYYY-MM-DD")]
		today: Option<String>,
	},
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = args.config.as_deref().map(cover_config::load).transpose()?;

	init_tracing(config.as_ref());

	let is_health = matches!(args.command, Command::Health);
	let output = execute(config, args.command).await?;
	let json = serde_json::to_string_pretty(&output)?;

	println!("{json}");

	if is_health && output["healthy"] != Value::Bool(true) {
		return Err(eyre::eyre!("Search engine is unhealthy."));
	}

	Ok(())
}

/// Runs `command` and returns the JSON document it reports.
pub async fn execute(config: Option<Config>, command: Command) -> color_eyre::Result<Value> {
	match command {
		Command::Health => {
			let service = connect(config)?;
			let healthy = service.health_check().await;

			service.close();

			Ok(json!({ "healthy": healthy }))
		},
		Command::Match { characteristics, limit } => {
			let service = connect(config)?;
			let characteristics: BuyerCharacteristics = read_json(&characteristics)?;
			let response =
				service.find_products(FindProductsRequest { characteristics, limit }).await;

			service.close();

			Ok(serde_json::to_value(response?)?)
		},
		Command::Analyze { profile, today } => {
			let profile: BuyerProfile = read_json(&profile)?;
			let today = match today {
				Some(raw) => parse_date(&raw)?,
				None => OffsetDateTime::now_utc().date(),
			};

			Ok(serde_json::to_value(profile.analyze(today))?)
		},
	}
}

fn connect(config: Option<Config>) -> color_eyre::Result<MatchingService> {
	let config = config.ok_or_else(|| eyre::eyre!("--config is required for this command."))?;

	Ok(MatchingService::new(config)?)
}

fn read_json<T>(path: &Path) -> color_eyre::Result<T>
where
	T: serde::de::DeserializeOwned,
{
	let raw = fs::read_to_string(path)?;

	Ok(serde_json::from_str(&raw)?)
}

fn parse_date(raw: &str) -> color_eyre::Result<Date> {
	Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
		.map_err(|err| eyre::eyre!("--today must be a YYYY-MM-DD date: {err}."))
}

fn init_tracing(config: Option<&Config>) {
	let level = config.map(|config| config.service.log_level.as_str()).unwrap_or("info");
	let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
