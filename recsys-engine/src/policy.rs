// ---------------------------------------------------------------------------
// RecommendationPolicy — correlation recommendations with popular fallback
// ---------------------------------------------------------------------------
//
// Unfitted until `fit` succeeds. Fitting derives the popularity ranking and
// the set of known item keys, and keeps a shared handle on the table so
// correlations can be computed per query.
//
// Query flow:
//   unknown item               -> popularity ranking
//   no usable correlations     -> popularity ranking
//   otherwise                  -> top items by correlation
// ---------------------------------------------------------------------------

use std::collections::HashSet;
use std::sync::Arc;

use crate::correlation::compute_correlations;
use crate::error::{RecsysError, Result};
use crate::popularity::PopularityRanker;
use crate::types::{ItemField, RatingTable, RecommendationSource, Recommendations};

pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Capabilities shared by every recommender.
pub trait Recommender {
	/// Derive all query-time state from `table`. Fitting again replaces it.
	fn fit(&mut self, table: Arc<RatingTable>) -> Result<()>;

	/// Up to `max_results` item keys for `query`, never including `query`.
	fn predict(&self, query: &str, max_results: usize) -> Result<Vec<String>>;
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

struct FittedState {
	table: Arc<RatingTable>,
	known_items: HashSet<String>,
}

pub struct RecommendationPolicy {
	field: ItemField,
	popularity: PopularityRanker,
	state: Option<FittedState>,
}

impl RecommendationPolicy {
	pub fn new(field: ItemField) -> Self {
		Self {
			field,
			popularity: PopularityRanker::new(field),
			state: None,
		}
	}

	/// Recommends book titles.
	pub fn books() -> Self {
		Self::new(ItemField::Title)
	}

	/// Recommends authors.
	pub fn authors() -> Self {
		Self::new(ItemField::Author)
	}

	pub fn field(&self) -> ItemField {
		self.field
	}

	pub fn is_fitted(&self) -> bool {
		self.state.is_some()
	}

	fn fitted(&self) -> Result<&FittedState> {
		self.state
			.as_ref()
			.ok_or(RecsysError::NotFitted("RecommendationPolicy"))
	}

	/// Whether `item` was present in the fitted table.
	pub fn is_known(&self, item: &str) -> Result<bool> {
		Ok(self.fitted()?.known_items.contains(item))
	}

	/// Like [`Recommender::predict`], but also reports which path produced
	/// the list.
	pub fn recommend(&self, query: &str, max_results: usize) -> Result<Recommendations> {
		let state = self.fitted()?;

		if !state.known_items.contains(query) {
			tracing::info!(query, field = %self.field, "unknown item, recommending popular");
			return self.popular(query, max_results, RecommendationSource::PopularUnknownItem);
		}

		let correlations = compute_correlations(&state.table, query);
		if correlations.is_empty() {
			tracing::info!(query, field = %self.field, "not enough data, recommending popular");
			return self.popular(
				query,
				max_results,
				RecommendationSource::PopularInsufficientData,
			);
		}

		// Truncate before filtering; the query is not back-filled.
		let items = correlations
			.ranked()
			.into_iter()
			.take(max_results)
			.filter(|(item, _)| *item != query)
			.map(|(item, _)| item.to_string())
			.collect();

		Ok(Recommendations {
			query: query.to_string(),
			source: RecommendationSource::Correlation,
			items,
		})
	}

	fn popular(
		&self,
		query: &str,
		max_results: usize,
		source: RecommendationSource,
	) -> Result<Recommendations> {
		Ok(Recommendations {
			query: query.to_string(),
			source,
			items: self.popularity.predict(query, max_results)?,
		})
	}
}

impl Recommender for RecommendationPolicy {
	fn fit(&mut self, table: Arc<RatingTable>) -> Result<()> {
		self.popularity.fit_table(&table)?;

		let known_items: HashSet<String> =
			table.rows().iter().map(|row| row.item.clone()).collect();
		tracing::debug!(
			field = %self.field,
			rows = table.len(),
			known_items = known_items.len(),
			"recommendation policy fitted"
		);

		self.state = Some(FittedState { table, known_items });
		Ok(())
	}

	fn predict(&self, query: &str, max_results: usize) -> Result<Vec<String>> {
		Ok(self.recommend(query, max_results)?.items)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::Rating;

	fn table(field: ItemField, rows: &[(u64, &str, f64)]) -> Arc<RatingTable> {
		Arc::new(RatingTable::new(
			field,
			rows.iter()
				.map(|&(user, item, rating)| Rating::new(user, item, rating))
				.collect(),
		))
	}

	fn fitted_books(rows: &[(u64, &str, f64)]) -> RecommendationPolicy {
		let mut policy = RecommendationPolicy::books();
		policy.fit(table(ItemField::Title, rows)).unwrap();
		policy
	}

	const INVERSE: &[(u64, &str, f64)] = &[
		(1, "A", 5.0),
		(1, "B", 3.0),
		(2, "A", 4.0),
		(2, "B", 2.0),
		(3, "A", 1.0),
		(3, "B", 5.0),
	];

	const MANY: &[(u64, &str, f64)] = &[
		(1, "A", 1.0),
		(1, "up", 1.0),
		(1, "down", 3.0),
		(1, "mixed", 2.0),
		(1, "flat", 4.0),
		(2, "A", 2.0),
		(2, "up", 2.0),
		(2, "down", 2.0),
		(2, "mixed", 1.0),
		(2, "flat", 4.0),
		(3, "A", 3.0),
		(3, "up", 3.0),
		(3, "down", 1.0),
		(3, "mixed", 3.0),
		(3, "flat", 4.0),
		(4, "lonely", 10.0),
	];

	// -- lifecycle -----------------------------------------------------------

	#[test]
	fn predict_before_fit_fails() {
		let policy = RecommendationPolicy::books();
		assert!(!policy.is_fitted());
		let err = policy.predict("a", DEFAULT_MAX_RESULTS).unwrap_err();
		assert!(matches!(err, RecsysError::NotFitted(_)));
		assert!(policy.is_known("a").is_err());
	}

	#[test]
	fn presets_group_by_expected_field() {
		assert_eq!(RecommendationPolicy::books().field(), ItemField::Title);
		assert_eq!(RecommendationPolicy::authors().field(), ItemField::Author);
	}

	#[test]
	fn fit_rejects_mismatched_table() {
		let mut policy = RecommendationPolicy::authors();
		let err = policy.fit(table(ItemField::Title, INVERSE)).unwrap_err();
		assert!(matches!(err, RecsysError::KeyMismatch { .. }));
		assert!(!policy.is_fitted());
	}

	#[test]
	fn fit_records_known_items() {
		let policy = fitted_books(INVERSE);
		assert!(policy.is_known("A").unwrap());
		assert!(policy.is_known("B").unwrap());
		assert!(!policy.is_known("Z").unwrap());
	}

	// -- correlation path ----------------------------------------------------

	#[test]
	fn inverse_ratings_recommend_other_item() {
		let policy = fitted_books(INVERSE);
		let recs = policy.recommend("A", DEFAULT_MAX_RESULTS).unwrap();
		assert_eq!(recs.source, RecommendationSource::Correlation);
		assert_eq!(recs.items, vec!["B"]);
	}

	#[test]
	fn results_are_ordered_by_correlation() {
		let policy = fitted_books(MANY);
		let recs = policy.predict("A", DEFAULT_MAX_RESULTS).unwrap();
		assert_eq!(recs, vec!["up", "mixed", "down"]);
	}

	#[test]
	fn zero_variance_items_never_recommended() {
		let policy = fitted_books(MANY);
		let recs = policy.predict("A", DEFAULT_MAX_RESULTS).unwrap();
		assert!(!recs.contains(&"flat".to_string()));
		assert!(!recs.contains(&"A".to_string()));
	}

	#[test]
	fn max_results_truncates_correlations() {
		let policy = fitted_books(MANY);
		assert_eq!(policy.predict("A", 2).unwrap(), vec!["up", "mixed"]);
	}

	#[test]
	fn repeated_predict_is_identical() {
		let policy = fitted_books(MANY);
		let first = policy.predict("A", DEFAULT_MAX_RESULTS).unwrap();
		let second = policy.predict("A", DEFAULT_MAX_RESULTS).unwrap();
		assert_eq!(first, second);
	}

	// -- popularity fallback -------------------------------------------------

	#[test]
	fn unknown_item_falls_back_to_popular() {
		let policy = fitted_books(MANY);
		let recs = policy.recommend("nope", 3).unwrap();
		assert_eq!(recs.source, RecommendationSource::PopularUnknownItem);
		// flat = 12, lonely = 10, A = down = mixed = up = 6
		assert_eq!(recs.items, vec!["flat", "lonely", "A"]);
	}

	#[test]
	fn item_with_single_rater_falls_back_to_popular() {
		let policy = fitted_books(&[
			(1, "A", 5.0),
			(1, "B", 3.0),
			(2, "A", 4.0),
			(2, "B", 2.0),
			(3, "C", 5.0),
		]);
		let recs = policy.recommend("C", DEFAULT_MAX_RESULTS).unwrap();
		assert_eq!(recs.source, RecommendationSource::PopularInsufficientData);
		assert_eq!(recs.items, vec!["A", "B"]);
	}

	#[test]
	fn fallback_does_not_back_fill_query_slot() {
		let policy = fitted_books(MANY);
		let recs = policy.recommend("lonely", 2).unwrap();
		assert_eq!(recs.source, RecommendationSource::PopularInsufficientData);
		assert_eq!(recs.items, vec!["flat"]);
	}

	#[test]
	fn author_policy_uses_author_keys() {
		let mut policy = RecommendationPolicy::authors();
		policy
			.fit(table(
				ItemField::Author,
				&[
					(1, "tolkien", 9.0),
					(1, "lewis", 8.0),
					(2, "tolkien", 3.0),
					(2, "lewis", 2.0),
				],
			))
			.unwrap();
		assert_eq!(policy.predict("tolkien", 5).unwrap(), vec!["lewis"]);
	}

	#[test]
	fn refit_replaces_known_items() {
		let mut policy = fitted_books(INVERSE);
		policy
			.fit(table(ItemField::Title, &[(1, "X", 1.0), (2, "Y", 2.0)]))
			.unwrap();
		assert!(!policy.is_known("A").unwrap());
		assert_eq!(
			policy.recommend("A", 10).unwrap().source,
			RecommendationSource::PopularUnknownItem
		);
	}
}
