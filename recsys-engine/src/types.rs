use std::fmt;

/// Opaque user identifier. Only compared for equality.
pub type UserId = u64;

// ---------------------------------------------------------------------------
// Item keys
// ---------------------------------------------------------------------------

/// Column an item key is projected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemField {
	Title,
	Author,
}

impl ItemField {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Title => "title",
			Self::Author => "author",
		}
	}
}

impl fmt::Display for ItemField {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

// ---------------------------------------------------------------------------
// Rating rows
// ---------------------------------------------------------------------------

/// One `(user, item_key, rating)` observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Rating {
	pub user: UserId,
	pub item: String,
	pub rating: f64,
}

impl Rating {
	pub fn new(user: UserId, item: impl Into<String>, rating: f64) -> Self {
		Self {
			user,
			item: item.into(),
			rating,
		}
	}
}

/// A catalogue entry joined with one rating, as produced by the loader.
#[derive(Debug, Clone, PartialEq)]
pub struct BookRating {
	pub user: UserId,
	pub isbn: String,
	pub title: String,
	pub author: Option<String>,
	pub rating: f64,
}

impl BookRating {
	/// The value of `field` for this row, if present and non-blank.
	pub fn key(&self, field: ItemField) -> Option<&str> {
		let value = match field {
			ItemField::Title => Some(self.title.as_str()),
			ItemField::Author => self.author.as_deref(),
		};
		value.filter(|v| !v.trim().is_empty())
	}
}

// ---------------------------------------------------------------------------
// RatingTable
// ---------------------------------------------------------------------------

/// The fully materialized rating table handed to `fit`.
///
/// Remembers which [`ItemField`] its item column was projected from so a
/// recommender configured for titles cannot silently be fitted on authors.
/// Duplicate `(user, item)` rows are kept as independent observations.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingTable {
	field: ItemField,
	rows: Vec<Rating>,
}

impl RatingTable {
	pub fn new(field: ItemField, rows: Vec<Rating>) -> Self {
		Self { field, rows }
	}

	/// Select `(user, <field>, rating)` from joined loader rows. Rows with a
	/// missing or blank key are dropped.
	pub fn from_book_ratings(rows: &[BookRating], field: ItemField) -> Self {
		let rows = rows
			.iter()
			.filter_map(|row| {
				row.key(field)
					.map(|key| Rating::new(row.user, key, row.rating))
			})
			.collect();
		Self { field, rows }
	}

	pub fn field(&self) -> ItemField {
		self.field
	}

	pub fn rows(&self) -> &[Rating] {
		&self.rows
	}

	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}
}

// ---------------------------------------------------------------------------
// Derived results
// ---------------------------------------------------------------------------

/// One entry of the popularity ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemScore {
	pub item: String,
	pub score: f64,
}

/// Pearson correlation of one item against the query item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correlation {
	pub coefficient: f64,
	/// Number of joined observations the coefficient was computed from.
	pub co_raters: usize,
}

/// Which path produced a recommendation list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendationSource {
	Correlation,
	PopularUnknownItem,
	PopularInsufficientData,
}

impl RecommendationSource {
	pub fn is_fallback(&self) -> bool {
		!matches!(self, Self::Correlation)
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendations {
	pub query: String,
	pub source: RecommendationSource,
	pub items: Vec<String>,
}
