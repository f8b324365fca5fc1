use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::instrument;
use uuid::Uuid;

use crate::{
    db::RatingStore,
    error::{AppError, AppResult},
    models::{MovieDetails, MovieFeatures, MovieId, Rating},
    services::{
        features::extract_features, providers::MetadataProvider, similarity::SimilarityMatrix,
    },
};

/// A candidate movie with its predicted rating
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredMovie {
    pub movie_id: MovieId,
    pub predicted_rating: f64,
}

/// Item-based recommender over the global rating universe
///
/// `initialize` loads every rating from the store, fetches metadata for each
/// rated movie and precomputes pairwise similarity. The result is an immutable
/// [`RecommendationSnapshot`] that answers queries without further I/O.
pub struct RecommenderEngine {
    rating_store: Arc<dyn RatingStore>,
    metadata_provider: Arc<dyn MetadataProvider>,
    fetch_timeout: Duration,
}

impl RecommenderEngine {
    pub fn new(
        rating_store: Arc<dyn RatingStore>,
        metadata_provider: Arc<dyn MetadataProvider>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            rating_store,
            metadata_provider,
            fetch_timeout,
        }
    }

    /// Builds a fresh snapshot from the current rating universe
    ///
    /// Ratings of all users are loaded; `user_id` only labels the trace span.
    /// Metadata failures shrink the feature set but never fail the call. Rating
    /// store failures are returned as `AppError::Database`.
    #[instrument(skip(self), fields(provider = self.metadata_provider.name()))]
    pub async fn initialize(&self, user_id: Uuid) -> AppResult<RecommendationSnapshot> {
        let start = Instant::now();

        let ratings = self.rating_store.fetch_rated_movies().await?;
        let movie_ids: BTreeSet<MovieId> = ratings.iter().map(|r| r.movie_id).collect();

        tracing::info!(
            ratings = ratings.len(),
            movies = movie_ids.len(),
            "Rating universe loaded"
        );

        let features = extract_features(
            Arc::clone(&self.metadata_provider),
            movie_ids,
            self.fetch_timeout,
        )
        .await;

        let snapshot = RecommendationSnapshot::new(ratings, features);

        tracing::info!(
            movies_with_features = snapshot.features.len(),
            processing_time_ms = start.elapsed().as_millis() as u64,
            "Recommendation snapshot initialized"
        );

        Ok(snapshot)
    }

    /// Initializes a snapshot and returns the top `limit` movies for `user_id`
    pub async fn recommend(&self, user_id: Uuid, limit: usize) -> AppResult<Vec<MovieId>> {
        let snapshot = self.initialize(user_id).await?;
        Ok(snapshot.recommendations(user_id, limit))
    }
}

/// Immutable state produced by [`RecommenderEngine::initialize`]
///
/// Safe to share between concurrent readers. Re-initializing builds a new
/// snapshot instead of mutating this one.
#[derive(Debug, Clone, Default)]
pub struct RecommendationSnapshot {
    ratings: Vec<Rating>,
    features: HashMap<MovieId, MovieFeatures>,
    matrix: SimilarityMatrix,
}

impl RecommendationSnapshot {
    pub fn new(ratings: Vec<Rating>, features: HashMap<MovieId, MovieFeatures>) -> Self {
        let matrix = SimilarityMatrix::build(&features);
        Self {
            ratings,
            features,
            matrix,
        }
    }

    /// Predicted ratings for every movie `user_id` has not rated, best first
    ///
    /// A candidate's prediction is the user's ratings averaged with similarity
    /// weights. Candidates with zero total similarity are dropped. Ties are
    /// broken by ascending movie id.
    pub fn scored_recommendations(&self, user_id: Uuid) -> Vec<ScoredMovie> {
        let user_ratings: Vec<&Rating> = self
            .ratings
            .iter()
            .filter(|r| r.user_id == user_id)
            .collect();

        if user_ratings.is_empty() || self.features.is_empty() || self.matrix.is_empty() {
            return Vec::new();
        }

        let rated: HashSet<MovieId> = user_ratings.iter().map(|r| r.movie_id).collect();
        let mut scored = Vec::new();

        for &candidate in self.matrix.movie_ids() {
            if rated.contains(&candidate) {
                continue;
            }

            let mut weighted_sum = 0.0;
            let mut total_similarity = 0.0;

            for rating in &user_ratings {
                // Rated movies without metadata are absent from the matrix
                let Some(similarity) = self.matrix.get(candidate, rating.movie_id) else {
                    continue;
                };
                weighted_sum += similarity * f64::from(rating.rating);
                total_similarity += similarity;
            }

            if total_similarity > 0.0 {
                scored.push(ScoredMovie {
                    movie_id: candidate,
                    predicted_rating: weighted_sum / total_similarity,
                });
            }
        }

        scored.sort_by(|a, b| {
            b.predicted_rating
                .total_cmp(&a.predicted_rating)
                .then_with(|| a.movie_id.cmp(&b.movie_id))
        });

        scored
    }

    /// Top `limit` movie ids for `user_id`; empty when there is nothing to go on
    pub fn recommendations(&self, user_id: Uuid, limit: usize) -> Vec<MovieId> {
        let recommendations: Vec<MovieId> = self
            .scored_recommendations(user_id)
            .into_iter()
            .take(limit)
            .map(|scored| scored.movie_id)
            .collect();

        tracing::debug!(
            user_id = %user_id,
            limit,
            returned = recommendations.len(),
            "Recommendations scored"
        );

        recommendations
    }
}

/// Resolves a caller-supplied limit against the configured default and maximum
///
/// Negative and oversized limits are rejected rather than clamped. `default` is
/// returned as given; configuration loading guarantees it does not exceed `max`.
pub fn validate_limit(limit: Option<i64>, default: usize, max: usize) -> AppResult<usize> {
    let Some(limit) = limit else {
        return Ok(default);
    };

    if limit < 0 {
        return Err(AppError::InvalidInput(format!(
            "limit must not be negative, got {}",
            limit
        )));
    }

    let limit = usize::try_from(limit)
        .map_err(|_| AppError::InvalidInput(format!("limit {} is too large", limit)))?;

    if limit > max {
        return Err(AppError::InvalidInput(format!(
            "limit must be at most {}, got {}",
            max, limit
        )));
    }

    Ok(limit)
}

/// Fetches full movie records for recommended ids, keeping their order
///
/// Movies whose details cannot be fetched in time are dropped from the result.
pub async fn resolve_movies(
    provider: Arc<dyn MetadataProvider>,
    movie_ids: &[MovieId],
    fetch_timeout: Duration,
) -> Vec<MovieDetails> {
    let mut tasks = Vec::with_capacity(movie_ids.len());

    for &movie_id in movie_ids {
        let provider = Arc::clone(&provider);
        let task = tokio::spawn(async move {
            tokio::time::timeout(fetch_timeout, provider.fetch_movie(movie_id)).await
        });
        tasks.push((movie_id, task));
    }

    let mut movies = Vec::with_capacity(tasks.len());

    for (movie_id, task) in tasks {
        match task.await {
            Ok(Ok(Ok(movie))) => movies.push(movie),
            Ok(Ok(Err(e))) => {
                tracing::warn!(movie_id, error = %e, "Failed to resolve recommended movie");
            }
            Ok(Err(_)) => {
                tracing::warn!(movie_id, "Timed out resolving recommended movie");
            }
            Err(e) => {
                tracing::error!(movie_id, error = %e, "Movie resolution task join error");
            }
        }
    }

    movies
}
