use std::path::PathBuf;

use thiserror::Error;

use crate::types::ItemField;

#[derive(Debug, Error)]
pub enum RecsysError {
	#[error("{0} is not fitted: call fit first")]
	NotFitted(&'static str),
	#[error("Unsupported query mode: pass --author or --book")]
	UnsupportedQueryMode,
	#[error("Group key mismatch: recommender groups by {expected}, table was projected by {found}")]
	KeyMismatch { expected: ItemField, found: ItemField },
	#[error("Cannot read data file {}: {source}", .path.display())]
	DataFile {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("CSV error: {0}")]
	Csv(#[from] csv::Error),
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl RecsysError {
	pub fn code(&self) -> &str {
		match self {
			Self::NotFitted(_) => "RECSYS_NOT_FITTED",
			Self::UnsupportedQueryMode => "RECSYS_UNSUPPORTED_QUERY_MODE",
			Self::KeyMismatch { .. } => "RECSYS_KEY_MISMATCH",
			Self::DataFile { .. } => "RECSYS_DATA_FILE",
			Self::Csv(_) => "RECSYS_CSV",
			Self::Json(_) => "RECSYS_JSON",
		}
	}
}

pub type Result<T> = std::result::Result<T, RecsysError>;
