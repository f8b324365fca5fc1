use std::{collections::HashMap, sync::Arc, time::Duration};

use crate::{
    error::{AppError, AppResult},
    models::{MovieDetails, MovieFeatures, MovieId},
    services::providers::MetadataProvider,
};

const VOTE_SCALE: f64 = 10.0;
const POPULARITY_SCALE: f64 = 1000.0;
const YEAR_ORIGIN: i32 = 1900;
const YEAR_SPAN: f64 = 200.0;

impl MovieFeatures {
    /// Normalizes provider metadata into a feature vector
    ///
    /// Fails when the release date is missing or malformed, since the year
    /// component of the vector cannot be computed.
    pub fn from_details(movie_id: MovieId, details: &MovieDetails) -> AppResult<Self> {
        let release_year = details.release_year().ok_or_else(|| {
            AppError::ExternalApi(format!(
                "Movie {} has no usable release date ({:?})",
                movie_id, details.release_date
            ))
        })?;

        Ok(Self {
            movie_id,
            genres: details.genres.iter().map(|g| g.id).collect(),
            normalized_vote: details.vote_average / VOTE_SCALE,
            normalized_popularity: details.popularity / POPULARITY_SCALE,
            normalized_year: f64::from(release_year - YEAR_ORIGIN) / YEAR_SPAN,
        })
    }
}

/// Fetches metadata for every movie concurrently and normalizes it
///
/// Each movie is fetched on its own task. A failed, timed-out or unparseable
/// fetch is logged and the movie is left out of the result; the batch itself
/// never fails.
pub async fn extract_features(
    provider: Arc<dyn MetadataProvider>,
    movie_ids: impl IntoIterator<Item = MovieId>,
    fetch_timeout: Duration,
) -> HashMap<MovieId, MovieFeatures> {
    let mut tasks = Vec::new();

    for movie_id in movie_ids {
        let provider = Arc::clone(&provider);
        let task = tokio::spawn(async move {
            let outcome = fetch_features(provider.as_ref(), movie_id, fetch_timeout).await;
            (movie_id, outcome)
        });
        tasks.push(task);
    }

    let requested = tasks.len();
    let mut features = HashMap::with_capacity(requested);
    let mut failures = 0usize;

    for task in tasks {
        match task.await {
            Ok((movie_id, Ok(movie_features))) => {
                features.insert(movie_id, movie_features);
            }
            Ok((movie_id, Err(e))) => {
                failures += 1;
                tracing::warn!(
                    movie_id,
                    error = %e,
                    provider = provider.name(),
                    "Skipping movie: feature extraction failed"
                );
            }
            Err(e) => {
                failures += 1;
                tracing::error!(error = %e, "Feature extraction task join error");
            }
        }
    }

    if failures > 0 {
        tracing::warn!(
            success_count = features.len(),
            error_count = failures,
            "Partial metadata fetch failure"
        );
    }

    tracing::info!(
        requested,
        extracted = features.len(),
        "Feature extraction completed"
    );

    features
}

async fn fetch_features(
    provider: &dyn MetadataProvider,
    movie_id: MovieId,
    fetch_timeout: Duration,
) -> AppResult<MovieFeatures> {
    let details = tokio::time::timeout(fetch_timeout, provider.fetch_movie(movie_id))
        .await
        .map_err(|_| {
            AppError::Timeout(format!(
                "Metadata fetch for movie {} exceeded {:?}",
                movie_id, fetch_timeout
            ))
        })??;

    MovieFeatures::from_details(movie_id, &details)
}
