use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use recsys_engine::config::CliArgs;
use recsys_engine::loader::load_book_ratings;
use recsys_engine::{RatingTable, Recommender};

fn main() {
	let args = CliArgs::parse();

	// Logs go to stderr; stdout carries only recommendations
	tracing_subscriber::fmt()
		.with_writer(std::io::stderr)
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
		)
		.init();

	if let Err(e) = run(&args) {
		tracing::error!("recsys failed: {:#}", e);
		std::process::exit(1);
	}
}

fn run(args: &CliArgs) -> Result<()> {
	let (mode, query) = args.query()?;

	let rows = load_book_ratings(&args.data_paths())?;
	let table = Arc::new(RatingTable::from_book_ratings(&rows, mode.field()));

	let mut policy = mode.policy();
	policy.fit(table)?;

	let recs = policy.recommend(&query, args.max_results)?;
	tracing::info!(
		query = %recs.query,
		source = ?recs.source,
		count = recs.items.len(),
		"recommendations ready"
	);

	let out = args.format.render(&recs.items)?;
	let mut stdout = std::io::stdout().lock();
	stdout.write_all(out.as_bytes())?;
	stdout.flush()?;
	Ok(())
}
