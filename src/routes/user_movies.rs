use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{MovieId, UserMovie, UserMovieUpdate, UserStats},
    routes::AppState,
};

/// Every tracked movie of the user, most recently watched first
pub async fn list_user_movies(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Vec<UserMovie>>> {
    let movies = state.rating_store.list_user_movies(user_id).await?;
    Ok(Json(movies))
}

pub async fn get_user_stats(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<UserStats>> {
    let movies = state.rating_store.list_user_movies(user_id).await?;
    Ok(Json(UserStats::from_movies(&movies)))
}

pub async fn get_user_movie(
    State(state): State<Arc<AppState>>,
    Path((user_id, movie_id)): Path<(Uuid, MovieId)>,
) -> AppResult<Json<UserMovie>> {
    state
        .rating_store
        .get_user_movie(user_id, movie_id)
        .await?
        .map(Json)
        .ok_or_else(|| {
            AppError::NotFound(format!("No entry for movie {} and user {}", movie_id, user_id))
        })
}

/// Rates a movie or changes its watched flag; absent fields are left as stored
pub async fn put_user_movie(
    State(state): State<Arc<AppState>>,
    Path((user_id, movie_id)): Path<(Uuid, MovieId)>,
    Json(update): Json<UserMovieUpdate>,
) -> AppResult<Json<UserMovie>> {
    update.validate()?;

    let user_movie = state
        .rating_store
        .upsert_user_movie(user_id, movie_id, update)
        .await?;

    Ok(Json(user_movie))
}

pub async fn delete_user_movie(
    State(state): State<Arc<AppState>>,
    Path((user_id, movie_id)): Path<(Uuid, MovieId)>,
) -> AppResult<StatusCode> {
    if state
        .rating_store
        .delete_user_movie(user_id, movie_id)
        .await?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!(
            "No entry for movie {} and user {}",
            movie_id, user_id
        )))
    }
}
