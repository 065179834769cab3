pub mod config;
pub mod correlation;
pub mod error;
pub mod loader;
pub mod policy;
pub mod popularity;
pub mod types;

pub use correlation::{compute_correlations, CorrelationResult};
pub use error::{RecsysError, Result};
pub use policy::{RecommendationPolicy, Recommender, DEFAULT_MAX_RESULTS};
pub use popularity::PopularityRanker;
pub use types::{ItemField, Rating, RatingTable, RecommendationSource, Recommendations};
