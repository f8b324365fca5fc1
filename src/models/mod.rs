use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod movie;
pub mod rating;

pub use movie::{Genre, MovieDetails, MovieFeatures, MovieId};
pub use rating::{
    Rating, UserMovie, UserMovieUpdate, UserStats, MAX_RATING, MIN_RATING, USER_STATS_LIST_LEN,
};

/// Query parameters accepted by the recommendations endpoint
#[derive(Debug, Default, Deserialize)]
pub struct RecommendationQuery {
    /// Maximum number of movies to return. Signed so that negative values reach
    /// validation instead of failing deserialization with an opaque message.
    pub limit: Option<i64>,
    /// Resolve recommended ids into full movie records
    #[serde(default)]
    pub include_details: bool,
}

/// Ranked recommendations for one user
#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub user_id: Uuid,
    /// Movie ids, best predicted score first
    pub movie_ids: Vec<MovieId>,
    /// Full records for `movie_ids`, present when details were requested.
    /// Movies whose details could not be fetched are left out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movies: Option<Vec<MovieDetails>>,
}
