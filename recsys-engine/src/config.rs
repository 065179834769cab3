use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::error::{RecsysError, Result};
use crate::loader::{normalize_key, DataPaths, DEFAULT_BOOKS_FILE, DEFAULT_RATINGS_FILE};
use crate::policy::{RecommendationPolicy, DEFAULT_MAX_RESULTS};
use crate::types::ItemField;

#[derive(Parser, Debug)]
#[command(name = "recsys", about = "Recommend related books or authors from BookCrossing ratings")]
pub struct CliArgs {
	/// Author name to find related authors for
	#[arg(short = 'a', long, group = "query")]
	pub author: Option<String>,

	/// Book title to find related books for
	#[arg(short = 'b', long, group = "query")]
	pub book: Option<String>,

	/// Directory containing the books and ratings CSV files
	#[arg(long, default_value = ".", env = "RECSYS_DATA_DIR")]
	pub data_dir: PathBuf,

	/// Books catalogue file name inside the data directory
	#[arg(long, default_value = DEFAULT_BOOKS_FILE)]
	pub books_file: String,

	/// Ratings file name inside the data directory
	#[arg(long, default_value = DEFAULT_RATINGS_FILE)]
	pub ratings_file: String,

	/// Maximum number of recommendations
	#[arg(short = 'n', long, default_value_t = DEFAULT_MAX_RESULTS)]
	pub max_results: usize,

	/// Output format
	#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
	pub format: OutputFormat,

	/// Log level (trace, debug, info, warn, error)
	#[arg(long, default_value = "info", env = "RECSYS_LOG_LEVEL")]
	pub log_level: String,
}

impl CliArgs {
	/// The selected mode and its normalized query value. An empty flag value
	/// counts as not given.
	pub fn query(&self) -> Result<(QueryMode, String)> {
		let author = self.author.as_deref().filter(|v| !v.is_empty());
		let book = self.book.as_deref().filter(|v| !v.is_empty());
		match (author, book) {
			(Some(author), _) => Ok((QueryMode::Author, normalize_key(author))),
			(None, Some(book)) => Ok((QueryMode::Book, normalize_key(book))),
			(None, None) => Err(RecsysError::UnsupportedQueryMode),
		}
	}

	pub fn data_paths(&self) -> DataPaths {
		DataPaths {
			data_dir: self.data_dir.clone(),
			books_file: self.books_file.clone(),
			ratings_file: self.ratings_file.clone(),
		}
	}
}

// ---------------------------------------------------------------------------
// Query mode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
	Author,
	Book,
}

impl QueryMode {
	pub fn field(&self) -> ItemField {
		match self {
			Self::Author => ItemField::Author,
			Self::Book => ItemField::Title,
		}
	}

	pub fn policy(&self) -> RecommendationPolicy {
		match self {
			Self::Author => RecommendationPolicy::authors(),
			Self::Book => RecommendationPolicy::books(),
		}
	}
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	Text,
	Json,
}

impl OutputFormat {
	pub fn render(&self, items: &[String]) -> Result<String> {
		match self {
			Self::Text => {
				let mut out = String::from("Recs are\n");
				for item in items {
					out.push_str(item);
					out.push('\n');
				}
				Ok(out)
			}
			Self::Json => {
				let mut out = serde_json::to_string(items)?;
				out.push('\n');
				Ok(out)
			}
		}
	}
}
