//! The Movie Database (TMDB) provider
//!
//! Uses the v3 REST API with a v4 read access token sent as a bearer token.
//! Movie details are cached in Redis since they change slowly and the
//! recommender asks for the whole rating universe on every initialization.

use reqwest::{Client as HttpClient, StatusCode};

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{MovieDetails, MovieId},
    services::providers::MetadataProvider,
};

const PROVIDER_NAME: &str = "tmdb";

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    access_token: String,
    api_url: String,
    cache: Cache,
    cache_ttl: u64,
}

impl TmdbProvider {
    pub fn new(cache: Cache, access_token: String, api_url: String, cache_ttl: u64) -> Self {
        Self {
            http_client: HttpClient::new(),
            access_token,
            api_url: api_url.trim_end_matches('/').to_string(),
            cache,
            cache_ttl,
        }
    }

    fn movie_url(&self, movie_id: MovieId) -> String {
        format!("{}/movie/{}", self.api_url, movie_id)
    }

    async fn call_api(&self, movie_id: MovieId) -> AppResult<MovieDetails> {
        let url = self.movie_url(movie_id);

        tracing::debug!(movie_id, url = %url, "Fetching movie from TMDB");

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("TMDB movie {}", movie_id)));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                movie_id,
                status = %status,
                body = %body,
                "TMDB request failed"
            );
            return Err(AppError::ExternalApi(format!(
                "TMDB returned status {}: {}",
                status, body
            )));
        }

        let movie: MovieDetails = response.json().await?;

        tracing::info!(
            movie_id,
            genres = movie.genres.len(),
            provider = PROVIDER_NAME,
            "Movie details fetched"
        );

        Ok(movie)
    }
}

#[async_trait::async_trait]
impl MetadataProvider for TmdbProvider {
    async fn fetch_movie(&self, movie_id: MovieId) -> AppResult<MovieDetails> {
        cached!(
            self.cache,
            CacheKey::MovieDetails(movie_id),
            self.cache_ttl,
            async move { self.call_api(movie_id).await }
        )
    }

    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_provider(api_url: &str) -> TmdbProvider {
        let redis_client = redis::Client::open("redis://127.0.0.1").unwrap();
        let (cache, _handle) = Cache::new(redis_client);
        TmdbProvider::new(cache, "test_token".to_string(), api_url.to_string(), 60)
    }

    #[tokio::test]
    async fn test_movie_url() {
        let provider = create_test_provider("https://api.themoviedb.org/3");
        assert_eq!(
            provider.movie_url(550),
            "https://api.themoviedb.org/3/movie/550"
        );
    }

    #[tokio::test]
    async fn test_movie_url_trims_trailing_slash() {
        let provider = create_test_provider("http://test.local/3/");
        assert_eq!(provider.movie_url(27205), "http://test.local/3/movie/27205");
    }

    #[tokio::test]
    async fn test_provider_name() {
        let provider = create_test_provider("http://test.local");
        assert_eq!(provider.name(), "tmdb");
    }
}
