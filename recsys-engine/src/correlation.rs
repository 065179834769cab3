// ---------------------------------------------------------------------------
// Correlation Engine — item-to-item Pearson correlation over co-raters
// ---------------------------------------------------------------------------
//
// For one target item, joins every rating of the target with every rating of
// another item by the same user, then computes the sample Pearson coefficient
// per other item as the sum of z-score products divided by (n - 1).
//
// Computed per query and never cached: the work is bounded by the rows of
// users who rated the target, not by the size of the catalogue.
// ---------------------------------------------------------------------------

use std::collections::{BTreeMap, HashMap};

use crate::types::{Correlation, RatingTable, UserId};

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// Correlations of every usable co-rated item against `target`.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationResult {
	target: String,
	items: BTreeMap<String, Correlation>,
}

impl CorrelationResult {
	fn empty(target: &str) -> Self {
		Self {
			target: target.to_string(),
			items: BTreeMap::new(),
		}
	}

	pub fn target(&self) -> &str {
		&self.target
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	pub fn get(&self, item: &str) -> Option<&Correlation> {
		self.items.get(item)
	}

	/// Entries in item-key order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &Correlation)> {
		self.items.iter().map(|(k, v)| (k.as_str(), v))
	}

	/// Entries sorted by coefficient, highest first. Equal coefficients keep
	/// item-key order.
	pub fn ranked(&self) -> Vec<(&str, Correlation)> {
		let mut ranked: Vec<(&str, Correlation)> =
			self.items.iter().map(|(k, v)| (k.as_str(), *v)).collect();
		ranked.sort_by(|a, b| b.1.coefficient.total_cmp(&a.1.coefficient));
		ranked
	}
}

// ---------------------------------------------------------------------------
// Sample statistics
// ---------------------------------------------------------------------------

struct PairStats {
	mean: f64,
	std: f64,
	target_mean: f64,
	target_std: f64,
}

impl PairStats {
	/// Means and sample standard deviations of both columns. `None` when
	/// either column has no variance.
	fn from_pairs(pairs: &[(f64, f64)]) -> Option<Self> {
		let ratings: Vec<f64> = pairs.iter().map(|p| p.0).collect();
		let target_ratings: Vec<f64> = pairs.iter().map(|p| p.1).collect();

		let rating_mean = mean(&ratings);
		let target_mean = mean(&target_ratings);
		let std = sample_std(&ratings, rating_mean)?;
		let target_std = sample_std(&target_ratings, target_mean)?;

		Some(Self {
			mean: rating_mean,
			std,
			target_mean,
			target_std,
		})
	}
}

fn mean(values: &[f64]) -> f64 {
	if values.is_empty() {
		return 0.0;
	}
	values.iter().sum::<f64>() / values.len() as f64
}

/// Standard deviation with Bessel's correction.
///
/// Returns `None` for fewer than two values or a single distinct value, so a
/// constant column is rejected even when rounding would leave a tiny
/// non-zero spread.
pub fn sample_std(values: &[f64], mean: f64) -> Option<f64> {
	if values.len() < 2 {
		return None;
	}
	let first = values[0];
	if values.iter().all(|&v| v == first) {
		return None;
	}

	let sum_sq: f64 = values.iter().map(|&v| (v - mean) * (v - mean)).sum();
	let std = (sum_sq / (values.len() - 1) as f64).sqrt();
	if std > 0.0 && std.is_finite() {
		Some(std)
	} else {
		None
	}
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

/// Pearson correlation between `target` and every item co-rated with it.
///
/// Returns an empty result when nobody rated `target` or no co-rated item has
/// variance on both sides; callers fall back to popularity in that case.
pub fn compute_correlations(table: &RatingTable, target: &str) -> CorrelationResult {
	let rows = table.rows();

	// Users who rated the target, with every rating they gave it. Duplicate
	// ratings are independent observations.
	let mut target_ratings: HashMap<UserId, Vec<f64>> = HashMap::new();
	for row in rows.iter().filter(|r| r.item == target) {
		target_ratings.entry(row.user).or_default().push(row.rating);
	}
	if target_ratings.is_empty() {
		return CorrelationResult::empty(target);
	}

	// Inner join on user: one (rating, target_rating) pair per combination of
	// a user's rating of another item and their rating of the target.
	let mut joined: BTreeMap<&str, Vec<(f64, f64)>> = BTreeMap::new();
	for row in rows.iter().filter(|r| r.item != target) {
		let Some(own) = target_ratings.get(&row.user) else {
			continue;
		};
		let pairs = joined.entry(row.item.as_str()).or_default();
		for &target_rating in own {
			pairs.push((row.rating, target_rating));
		}
	}

	let mut items = BTreeMap::new();
	for (item, pairs) in joined {
		if let Some(correlation) = correlate_pairs(&pairs) {
			items.insert(item.to_string(), correlation);
		}
	}

	tracing::debug!(
		item = target,
		co_raters = target_ratings.len(),
		correlated = items.len(),
		"correlations computed"
	);

	CorrelationResult {
		target: target.to_string(),
		items,
	}
}

/// Sum of z-score products over `n - 1`. `None` when the pair cannot yield a
/// defined coefficient.
fn correlate_pairs(pairs: &[(f64, f64)]) -> Option<Correlation> {
	let n = pairs.len();
	if n < 2 {
		return None;
	}
	let stats = PairStats::from_pairs(pairs)?;

	let sum: f64 = pairs
		.iter()
		.map(|&(rating, target_rating)| {
			(rating - stats.mean) * (target_rating - stats.target_mean)
				/ (stats.std * stats.target_std)
		})
		.sum();

	let coefficient = sum / (n - 1) as f64;
	if !coefficient.is_finite() {
		return None;
	}
	Some(Correlation {
		coefficient,
		co_raters: n,
	})
}
