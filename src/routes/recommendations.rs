use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{RecommendationQuery, RecommendationResponse},
    routes::AppState,
    services::recommendations::{resolve_movies, validate_limit},
};

/// Handler for the recommendations endpoint
///
/// Builds a fresh snapshot of the rating universe for every request.
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<RecommendationQuery>,
) -> AppResult<Json<RecommendationResponse>> {
    let limit = validate_limit(
        query.limit,
        state.settings.default_limit,
        state.settings.max_limit,
    )?;

    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        limit,
        include_details = query.include_details,
        "Processing recommendation request"
    );

    let movie_ids = state.engine.recommend(user_id, limit).await?;

    let movies = if query.include_details {
        Some(
            resolve_movies(
                Arc::clone(&state.metadata_provider),
                &movie_ids,
                state.settings.fetch_timeout,
            )
            .await,
        )
    } else {
        None
    };

    tracing::info!(
        request_id = %request_id,
        recommended = movie_ids.len(),
        "Recommendations completed"
    );

    Ok(Json(RecommendationResponse {
        user_id,
        movie_ids,
        movies,
    }))
}
