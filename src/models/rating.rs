use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::MovieId;
use crate::error::{AppError, AppResult};

pub const MIN_RATING: i16 = 1;
pub const MAX_RATING: i16 = 5;

/// One row of the rating universe: a user's star rating for a movie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Rating {
    pub user_id: Uuid,
    pub movie_id: MovieId,
    pub rating: i16,
}

/// A user's tracked movie as persisted in `user_movies`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserMovie {
    pub id: Uuid,
    pub user_id: Uuid,
    pub movie_id: MovieId,
    pub rating: Option<i16>,
    pub watched: bool,
    pub watched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial change to a user's movie entry
///
/// Absent fields keep their stored value. `rating` distinguishes an absent key
/// (`None`) from an explicit `null` (`Some(None)`), which clears the rating.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserMovieUpdate {
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub rating: Option<Option<i16>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watched: Option<bool>,
}

/// Maps a key that is present (even as `null`) to `Some`
fn deserialize_present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl UserMovieUpdate {
    pub fn validate(&self) -> AppResult<()> {
        match self.rating {
            Some(Some(rating)) if !(MIN_RATING..=MAX_RATING).contains(&rating) => {
                Err(AppError::InvalidInput(format!(
                    "Rating must be between {} and {}, got {}",
                    MIN_RATING, MAX_RATING, rating
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Number of entries kept in each [`UserStats`] list
pub const USER_STATS_LIST_LEN: usize = 10;

/// Profile summary of a user's tracked movies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    /// Movies the user has rated
    pub total_watched: usize,
    /// Mean of the user's ratings, 0 when nothing is rated
    pub average_rating: f64,
    /// Rated movies, most recently watched first
    pub recently_watched: Vec<UserMovie>,
    /// Tracked movies not yet watched
    pub watchlist: Vec<UserMovie>,
}

impl UserStats {
    /// Summarizes entries ordered most recently watched first
    pub fn from_movies(movies: &[UserMovie]) -> Self {
        let rated: Vec<&UserMovie> = movies.iter().filter(|m| m.rating.is_some()).collect();

        let average_rating = if rated.is_empty() {
            0.0
        } else {
            let sum: i64 = rated
                .iter()
                .filter_map(|m| m.rating)
                .map(i64::from)
                .sum();
            sum as f64 / rated.len() as f64
        };

        Self {
            total_watched: rated.len(),
            average_rating,
            recently_watched: rated
                .iter()
                .take(USER_STATS_LIST_LEN)
                .map(|m| (*m).clone())
                .collect(),
            watchlist: movies
                .iter()
                .filter(|m| !m.watched)
                .take(USER_STATS_LIST_LEN)
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tokio_test::{assert_err, assert_ok};

    fn entry(movie_id: MovieId, rating: Option<i16>, watched: bool, day: u32) -> UserMovie {
        let stamp = Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap();
        UserMovie {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            movie_id,
            rating,
            watched,
            watched_at: watched.then_some(stamp),
            created_at: stamp,
            updated_at: stamp,
        }
    }

    #[test]
    fn test_validate_accepts_rating_range() {
        for rating in MIN_RATING..=MAX_RATING {
            let update = UserMovieUpdate {
                rating: Some(Some(rating)),
                watched: Some(true),
            };
            assert_ok!(update.validate());
        }
    }

    #[test]
    fn test_validate_accepts_cleared_and_absent_rating() {
        assert_ok!(UserMovieUpdate::default().validate());
        let cleared = UserMovieUpdate {
            rating: Some(None),
            watched: None,
        };
        assert_ok!(cleared.validate());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        for rating in [0, 6, -1] {
            let update = UserMovieUpdate {
                rating: Some(Some(rating)),
                watched: None,
            };
            let err = assert_err!(update.validate());
            assert!(matches!(err, AppError::InvalidInput(_)));
        }
    }

    #[test]
    fn test_update_tells_absent_from_null() {
        let rating_only: UserMovieUpdate = serde_json::from_str(r#"{"rating": 4}"#).unwrap();
        assert_eq!(rating_only.rating, Some(Some(4)));
        assert_eq!(rating_only.watched, None);

        let cleared: UserMovieUpdate = serde_json::from_str(r#"{"rating": null}"#).unwrap();
        assert_eq!(cleared.rating, Some(None));

        let watched_only: UserMovieUpdate = serde_json::from_str(r#"{"watched": false}"#).unwrap();
        assert_eq!(watched_only.rating, None);
        assert_eq!(watched_only.watched, Some(false));
    }

    #[test]
    fn test_update_serializes_only_present_fields() {
        let update = UserMovieUpdate {
            rating: Some(None),
            watched: None,
        };
        assert_eq!(serde_json::to_string(&update).unwrap(), r#"{"rating":null}"#);
    }

    #[test]
    fn test_stats_summarize_rated_and_watchlist() {
        let movies = vec![
            entry(1, Some(5), true, 20),
            entry(2, Some(2), true, 10),
            entry(3, None, true, 5),
            entry(4, None, false, 1),
            entry(5, Some(4), false, 1),
        ];

        let stats = UserStats::from_movies(&movies);

        assert_eq!(stats.total_watched, 3);
        assert!((stats.average_rating - 11.0 / 3.0).abs() < 1e-12);
        let recent: Vec<MovieId> = stats.recently_watched.iter().map(|m| m.movie_id).collect();
        assert_eq!(recent, vec![1, 2, 5]);
        let watchlist: Vec<MovieId> = stats.watchlist.iter().map(|m| m.movie_id).collect();
        assert_eq!(watchlist, vec![4, 5]);
    }

    #[test]
    fn test_stats_for_empty_history() {
        let stats = UserStats::from_movies(&[]);
        assert_eq!(stats.total_watched, 0);
        assert_eq!(stats.average_rating, 0.0);
        assert!(stats.recently_watched.is_empty());
        assert!(stats.watchlist.is_empty());
    }

    #[test]
    fn test_stats_lists_are_capped() {
        let movies: Vec<UserMovie> = (1..=15)
            .map(|id| entry(id, Some(3), id % 2 == 0, 1))
            .chain((16..=30).map(|id| entry(id, None, false, 1)))
            .collect();

        let stats = UserStats::from_movies(&movies);

        assert_eq!(stats.total_watched, 15);
        assert_eq!(stats.recently_watched.len(), USER_STATS_LIST_LEN);
        assert_eq!(stats.watchlist.len(), USER_STATS_LIST_LEN);
    }
}
