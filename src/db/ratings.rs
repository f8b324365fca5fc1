//! Rating store: the `user_movies` table
//!
//! The recommender only ever reads from the store (`fetch_rated_movies`). The
//! write operations back the user-movie HTTP endpoints.

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{MovieId, Rating, UserMovie, UserMovieUpdate},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RatingStore: Send + Sync {
    /// Every rating across all users where the rating is present
    ///
    /// Fails with `AppError::Database` on connectivity or query failure.
    async fn fetch_rated_movies(&self) -> AppResult<Vec<Rating>>;

    async fn get_user_movie(&self, user_id: Uuid, movie_id: MovieId)
        -> AppResult<Option<UserMovie>>;

    /// Every entry the user tracks, most recently watched first
    ///
    /// Unwatched entries follow the watched ones, newest change first.
    async fn list_user_movies(&self, user_id: Uuid) -> AppResult<Vec<UserMovie>>;

    /// Creates the user's entry for a movie or applies a partial change to it
    ///
    /// Fields absent from `update` keep their stored value; a new entry starts
    /// unrated and unwatched.
    async fn upsert_user_movie(
        &self,
        user_id: Uuid,
        movie_id: MovieId,
        update: UserMovieUpdate,
    ) -> AppResult<UserMovie>;

    /// Returns `true` when a row was removed
    async fn delete_user_movie(&self, user_id: Uuid, movie_id: MovieId) -> AppResult<bool>;
}

#[derive(Clone)]
pub struct PgRatingStore {
    pool: PgPool,
}

impl PgRatingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl RatingStore for PgRatingStore {
    async fn fetch_rated_movies(&self) -> AppResult<Vec<Rating>> {
        let ratings = sqlx::query_as::<_, Rating>(
            r#"
            SELECT user_id, movie_id, rating
            FROM user_movies
            WHERE rating IS NOT NULL
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to load rating universe");
            e
        })?;

        tracing::debug!(count = ratings.len(), "Loaded rated movies");

        Ok(ratings)
    }

    async fn get_user_movie(
        &self,
        user_id: Uuid,
        movie_id: MovieId,
    ) -> AppResult<Option<UserMovie>> {
        let row = sqlx::query_as::<_, UserMovie>(
            r#"
            SELECT id, user_id, movie_id, rating, watched, watched_at, created_at, updated_at
            FROM user_movies
            WHERE user_id = $1 AND movie_id = $2
            "#,
        )
        .bind(user_id)
        .bind(movie_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list_user_movies(&self, user_id: Uuid) -> AppResult<Vec<UserMovie>> {
        let rows = sqlx::query_as::<_, UserMovie>(
            r#"
            SELECT id, user_id, movie_id, rating, watched, watched_at, created_at, updated_at
            FROM user_movies
            WHERE user_id = $1
            ORDER BY watched_at DESC NULLS LAST, updated_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(user_id = %user_id, count = rows.len(), "Loaded user movies");

        Ok(rows)
    }

    async fn upsert_user_movie(
        &self,
        user_id: Uuid,
        movie_id: MovieId,
        update: UserMovieUpdate,
    ) -> AppResult<UserMovie> {
        // $3 tells an absent rating apart from an explicit null.
        // watched_at keeps its first timestamp while the movie stays watched.
        let row = sqlx::query_as::<_, UserMovie>(
            r#"
            INSERT INTO user_movies (user_id, movie_id, rating, watched, watched_at)
            VALUES (
                $1, $2, $4,
                COALESCE($5, FALSE),
                CASE WHEN COALESCE($5, FALSE) THEN now() ELSE NULL END
            )
            ON CONFLICT (user_id, movie_id) DO UPDATE SET
                rating = CASE WHEN $3 THEN EXCLUDED.rating ELSE user_movies.rating END,
                watched = COALESCE($5, user_movies.watched),
                watched_at = CASE
                    WHEN COALESCE($5, user_movies.watched)
                        THEN COALESCE(user_movies.watched_at, now())
                    ELSE NULL
                END,
                updated_at = now()
            RETURNING id, user_id, movie_id, rating, watched, watched_at, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(movie_id)
        .bind(update.rating.is_some())
        .bind(update.rating.flatten())
        .bind(update.watched)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(
            user_id = %user_id,
            movie_id,
            rating = ?row.rating,
            watched = row.watched,
            "User movie saved"
        );

        Ok(row)
    }

    async fn delete_user_movie(&self, user_id: Uuid, movie_id: MovieId) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM user_movies
            WHERE user_id = $1 AND movie_id = $2
            "#,
        )
        .bind(user_id)
        .bind(movie_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
