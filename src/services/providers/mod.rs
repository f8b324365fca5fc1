//! Movie metadata provider abstraction
//!
//! The recommender needs genres, vote average, popularity and release date for
//! every movie in the rating universe. Providers fetch one movie at a time;
//! batching and failure isolation live in the feature extractor.

use crate::{
    error::AppResult,
    models::{MovieDetails, MovieId},
};

pub mod tmdb;

pub use tmdb::TmdbProvider;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Fetch details for a single movie
    ///
    /// Fails with `NotFound` for unknown ids and `ExternalApi`/`HttpClient` on
    /// transport problems. Each call fails independently.
    async fn fetch_movie(&self, movie_id: MovieId) -> AppResult<MovieDetails>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
