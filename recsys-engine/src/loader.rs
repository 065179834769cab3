// ---------------------------------------------------------------------------
// Loader — BookCrossing CSV ingestion
// ---------------------------------------------------------------------------
//
// Reads the books catalogue and the ratings file, repairs the catalogue rows
// known to be shifted, normalizes titles and authors to lower case, and joins
// ratings to books on ISBN. Ratings for ISBNs missing from the catalogue are
// dropped.
// ---------------------------------------------------------------------------

use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{RecsysError, Result};
use crate::types::{BookRating, UserId};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

pub const DEFAULT_BOOKS_FILE: &str = "Books.csv";
pub const DEFAULT_RATINGS_FILE: &str = "Ratings.csv";

/// Where the two input files live.
#[derive(Debug, Clone)]
pub struct DataPaths {
	pub data_dir: PathBuf,
	pub books_file: String,
	pub ratings_file: String,
}

impl Default for DataPaths {
	fn default() -> Self {
		Self {
			data_dir: PathBuf::from("."),
			books_file: DEFAULT_BOOKS_FILE.to_string(),
			ratings_file: DEFAULT_RATINGS_FILE.to_string(),
		}
	}
}

impl DataPaths {
	pub fn new(data_dir: impl Into<PathBuf>) -> Self {
		Self {
			data_dir: data_dir.into(),
			..Self::default()
		}
	}

	pub fn books_path(&self) -> PathBuf {
		self.data_dir.join(&self.books_file)
	}

	pub fn ratings_path(&self) -> PathBuf {
		self.data_dir.join(&self.ratings_file)
	}
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One catalogue row. Columns other than these three are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BookRecord {
	#[serde(rename = "ISBN")]
	pub isbn: String,
	#[serde(rename = "Book-Title")]
	pub title: String,
	#[serde(rename = "Book-Author", default)]
	pub author: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RatingRecord {
	#[serde(rename = "User-ID")]
	pub user: UserId,
	#[serde(rename = "ISBN")]
	pub isbn: String,
	#[serde(rename = "Book-Rating")]
	pub rating: f64,
}

// ---------------------------------------------------------------------------
// Catalogue repairs
// ---------------------------------------------------------------------------

struct BookFixup {
	isbn: &'static str,
	title: &'static str,
	author: &'static str,
}

/// Rows whose fields are shifted by an unescaped quote in the source data.
const BOOK_FIXUPS: &[BookFixup] = &[
	BookFixup {
		isbn: "0789466953",
		title: "DK Readers: Creating the X-Men, How Comic Books Come to Life (Level 4: Proficient Readers)",
		author: "James Buckley",
	},
	BookFixup {
		isbn: "078946697X",
		title: "DK Readers: Creating the X-Men, How It All Began (Level 4: Proficient Readers)",
		author: "Michael Teitelbaum",
	},
	BookFixup {
		isbn: "2070426769",
		title: "Peuple du ciel, suivi de 'Les Bergers",
		author: "Jean-Marie Gustave Le Clézio",
	},
];

fn apply_fixups(book: &mut BookRecord) {
	if let Some(fix) = BOOK_FIXUPS.iter().find(|f| f.isbn == book.isbn) {
		book.title = fix.title.to_string();
		book.author = Some(fix.author.to_string());
	}
}

/// Item key normalization: trimmed and lower-cased.
pub fn normalize_key(value: &str) -> String {
	value.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

fn csv_reader<R: io::Read>(reader: R) -> csv::Reader<R> {
	csv::ReaderBuilder::new()
		.flexible(true)
		.trim(csv::Trim::Headers)
		.from_reader(reader)
}

/// Parse a books CSV, applying catalogue repairs.
pub fn read_books<R: io::Read>(reader: R) -> Result<Vec<BookRecord>> {
	let mut books = Vec::new();
	for record in csv_reader(reader).deserialize() {
		let mut book: BookRecord = record?;
		apply_fixups(&mut book);
		books.push(book);
	}
	Ok(books)
}

pub fn read_ratings<R: io::Read>(reader: R) -> Result<Vec<RatingRecord>> {
	let mut ratings = Vec::new();
	for record in csv_reader(reader).deserialize() {
		let rating: RatingRecord = record?;
		ratings.push(rating);
	}
	Ok(ratings)
}

fn open(path: &Path) -> Result<File> {
	File::open(path).map_err(|source| RecsysError::DataFile {
		path: path.to_path_buf(),
		source,
	})
}

// ---------------------------------------------------------------------------
// Joining
// ---------------------------------------------------------------------------

/// Inner join of ratings and books on ISBN, in ratings order. A rating whose
/// ISBN appears on several catalogue rows yields one row per catalogue row.
pub fn join_book_ratings(books: &[BookRecord], ratings: &[RatingRecord]) -> Vec<BookRating> {
	let mut by_isbn: HashMap<&str, Vec<(String, Option<String>)>> = HashMap::new();
	for book in books {
		let author = book
			.author
			.as_deref()
			.map(normalize_key)
			.filter(|a| !a.is_empty());
		by_isbn
			.entry(book.isbn.as_str())
			.or_default()
			.push((normalize_key(&book.title), author));
	}

	let mut rows = Vec::with_capacity(ratings.len());
	for rating in ratings {
		let Some(entries) = by_isbn.get(rating.isbn.as_str()) else {
			continue;
		};
		for (title, author) in entries {
			rows.push(BookRating {
				user: rating.user,
				isbn: rating.isbn.clone(),
				title: title.clone(),
				author: author.clone(),
				rating: rating.rating,
			});
		}
	}
	rows
}

/// Read both files under `paths` and return the joined rows.
pub fn load_book_ratings(paths: &DataPaths) -> Result<Vec<BookRating>> {
	let books_path = paths.books_path();
	let ratings_path = paths.ratings_path();

	let books = read_books(open(&books_path)?)?;
	tracing::info!(path = %books_path.display(), books = books.len(), "catalogue loaded");

	let ratings = read_ratings(open(&ratings_path)?)?;
	tracing::info!(path = %ratings_path.display(), ratings = ratings.len(), "ratings loaded");

	let rows = join_book_ratings(&books, &ratings);
	tracing::info!(
		rows = rows.len(),
		dropped = ratings.len().saturating_sub(rows.len()),
		"ratings joined to catalogue"
	);
	Ok(rows)
}
