// ---------------------------------------------------------------------------
// PopularityRanker — total-rating ranking used as the fallback recommender
// ---------------------------------------------------------------------------
//
// Sums the rating column per item key and keeps the items sorted by that
// total, highest first. Ties keep item-key order: totals are accumulated in
// a BTreeMap and the sort is stable, so the ranking is reproducible.
// ---------------------------------------------------------------------------

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{RecsysError, Result};
use crate::policy::Recommender;
use crate::types::{ItemField, ItemScore, Rating, RatingTable};

/// Sum `rating` per item and sort descending by the sum.
pub fn rank_by_total(rows: &[Rating]) -> Vec<ItemScore> {
	let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
	for row in rows {
		*totals.entry(row.item.as_str()).or_insert(0.0) += row.rating;
	}

	let mut ranking: Vec<ItemScore> = totals
		.into_iter()
		.map(|(item, score)| ItemScore {
			item: item.to_string(),
			score,
		})
		.collect();
	ranking.sort_by(|a, b| b.score.total_cmp(&a.score));
	ranking
}

// ---------------------------------------------------------------------------
// PopularityRanker
// ---------------------------------------------------------------------------

pub struct PopularityRanker {
	field: ItemField,
	ranking: Option<Vec<ItemScore>>,
}

impl PopularityRanker {
	pub fn new(field: ItemField) -> Self {
		Self {
			field,
			ranking: None,
		}
	}

	pub fn field(&self) -> ItemField {
		self.field
	}

	pub fn is_fitted(&self) -> bool {
		self.ranking.is_some()
	}

	/// The full ranking computed at fit time.
	pub fn ranking(&self) -> Result<&[ItemScore]> {
		self.ranking
			.as_deref()
			.ok_or(RecsysError::NotFitted("PopularityRanker"))
	}

	/// Fit directly from a borrowed table. Nothing from the table is retained
	/// besides the derived ranking.
	pub fn fit_table(&mut self, table: &RatingTable) -> Result<()> {
		if table.field() != self.field {
			return Err(RecsysError::KeyMismatch {
				expected: self.field,
				found: table.field(),
			});
		}
		let ranking = rank_by_total(table.rows());
		tracing::debug!(
			field = %self.field,
			rows = table.len(),
			items = ranking.len(),
			"popularity ranking fitted"
		);
		self.ranking = Some(ranking);
		Ok(())
	}
}

impl Recommender for PopularityRanker {
	fn fit(&mut self, table: Arc<RatingTable>) -> Result<()> {
		self.fit_table(&table)
	}

	/// Top `max_results` of the ranking with `exclude` removed. Removed slots
	/// are not back-filled, so the list can be one shorter than requested.
	fn predict(&self, exclude: &str, max_results: usize) -> Result<Vec<String>> {
		let ranking = self.ranking()?;
		Ok(ranking
			.iter()
			.take(max_results)
			.filter(|entry| entry.item != exclude)
			.map(|entry| entry.item.clone())
			.collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn table(rows: &[(u64, &str, f64)]) -> Arc<RatingTable> {
		Arc::new(RatingTable::new(
			ItemField::Title,
			rows.iter()
				.map(|&(user, item, rating)| Rating::new(user, item, rating))
				.collect(),
		))
	}

	fn fitted(rows: &[(u64, &str, f64)]) -> PopularityRanker {
		let mut ranker = PopularityRanker::new(ItemField::Title);
		ranker.fit(table(rows)).unwrap();
		ranker
	}

	// -- rank_by_total -------------------------------------------------------

	#[test]
	fn totals_are_summed_per_item() {
		let ranking = rank_by_total(&[
			Rating::new(1, "a", 2.0),
			Rating::new(2, "a", 3.0),
			Rating::new(1, "b", 4.0),
		]);
		assert_eq!(ranking.len(), 2);
		assert_eq!(ranking[0].item, "a");
		assert!((ranking[0].score - 5.0).abs() < 1e-10);
		assert_eq!(ranking[1].item, "b");
	}

	#[test]
	fn ranking_is_non_increasing() {
		let ranking = rank_by_total(&[
			Rating::new(1, "x", 1.0),
			Rating::new(1, "y", 7.0),
			Rating::new(2, "z", 3.0),
			Rating::new(3, "y", 1.0),
			Rating::new(3, "w", 10.0),
		]);
		for pair in ranking.windows(2) {
			assert!(pair[0].score >= pair[1].score);
		}
	}

	#[test]
	fn ties_keep_item_key_order() {
		let ranking = rank_by_total(&[
			Rating::new(1, "c", 5.0),
			Rating::new(1, "a", 5.0),
			Rating::new(1, "b", 5.0),
		]);
		let items: Vec<&str> = ranking.iter().map(|s| s.item.as_str()).collect();
		assert_eq!(items, vec!["a", "b", "c"]);
	}

	#[test]
	fn empty_rows_give_empty_ranking() {
		assert!(rank_by_total(&[]).is_empty());
	}

	// -- predict -------------------------------------------------------------

	#[test]
	fn predict_before_fit_fails() {
		let ranker = PopularityRanker::new(ItemField::Title);
		let err = ranker.predict("a", 10).unwrap_err();
		assert!(matches!(err, RecsysError::NotFitted(_)));
	}

	#[test]
	fn predict_returns_top_items() {
		let ranker = fitted(&[(1, "a", 1.0), (1, "b", 5.0), (2, "c", 3.0)]);
		assert_eq!(ranker.predict("zzz", 2).unwrap(), vec!["b", "c"]);
	}

	#[test]
	fn excluded_item_is_not_back_filled() {
		let ranker = fitted(&[(1, "a", 1.0), (1, "b", 5.0), (2, "c", 3.0)]);
		assert_eq!(ranker.predict("b", 2).unwrap(), vec!["c"]);
	}

	#[test]
	fn excluded_item_outside_top_changes_nothing() {
		let ranker = fitted(&[(1, "a", 1.0), (1, "b", 5.0), (2, "c", 3.0)]);
		assert_eq!(ranker.predict("a", 2).unwrap(), vec!["b", "c"]);
	}

	#[test]
	fn zero_max_results_is_empty() {
		let ranker = fitted(&[(1, "a", 1.0)]);
		assert!(ranker.predict("x", 0).unwrap().is_empty());
	}

	#[test]
	fn fit_rejects_table_projected_by_other_field() {
		let mut ranker = PopularityRanker::new(ItemField::Author);
		let err = ranker.fit(table(&[(1, "a", 1.0)])).unwrap_err();
		assert!(matches!(err, RecsysError::KeyMismatch { .. }));
		assert!(!ranker.is_fitted());
	}

	#[test]
	fn refit_replaces_ranking() {
		let mut ranker = fitted(&[(1, "a", 1.0)]);
		ranker.fit(table(&[(1, "b", 2.0)])).unwrap();
		assert_eq!(ranker.predict("x", 10).unwrap(), vec!["b"]);
	}
}
