use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// TMDB movie identifier
pub type MovieId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// Movie details as served by the metadata provider (`GET /movie/{id}`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetails {
    pub id: MovieId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    pub vote_average: f64,
    pub popularity: f64,
    /// `YYYY-MM-DD`; TMDB sends an empty string for unreleased titles
    #[serde(default)]
    pub release_date: Option<String>,
}

impl MovieDetails {
    /// Year component of `release_date`, if it parses
    pub fn release_year(&self) -> Option<i32> {
        self.release_date
            .as_deref()
            .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
            .map(|date| date.year())
    }
}

/// Normalized feature vector for a single movie
///
/// Built once per movie when a recommendation snapshot is initialized and never
/// modified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieFeatures {
    pub movie_id: MovieId,
    pub genres: BTreeSet<i64>,
    /// vote average / 10
    pub normalized_vote: f64,
    /// popularity / 1000 (not clamped; TMDB popularity is unbounded)
    pub normalized_popularity: f64,
    /// (release year - 1900) / 200
    pub normalized_year: f64,
}

impl MovieFeatures {
    /// Continuous part of the feature vector: `[vote, popularity, year]`
    pub fn metric_vector(&self) -> [f64; 3] {
        [
            self.normalized_vote,
            self.normalized_popularity,
            self.normalized_year,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(release_date: Option<&str>) -> MovieDetails {
        MovieDetails {
            id: 27205,
            title: "Inception".to_string(),
            overview: None,
            poster_path: None,
            genres: vec![],
            vote_average: 8.4,
            popularity: 120.5,
            release_date: release_date.map(str::to_string),
        }
    }

    #[test]
    fn test_release_year_parses_tmdb_dates() {
        assert_eq!(details(Some("2010-07-15")).release_year(), Some(2010));
    }

    #[test]
    fn test_release_year_missing_or_empty() {
        assert_eq!(details(None).release_year(), None);
        assert_eq!(details(Some("")).release_year(), None);
        assert_eq!(details(Some("not a date")).release_year(), None);
    }

    #[test]
    fn test_deserialize_tmdb_payload() {
        let json = r#"{
            "id": 550,
            "title": "Fight Club",
            "overview": "A ticking-time-bomb insomniac...",
            "poster_path": "/pB8BM7pdSp6B6Ih7QZ4DrQ3PmJK.jpg",
            "genres": [{"id": 18, "name": "Drama"}],
            "vote_average": 8.433,
            "popularity": 61.416,
            "release_date": "1999-10-15",
            "runtime": 139,
            "tagline": "Mischief. Mayhem. Soap."
        }"#;

        let movie: MovieDetails = serde_json::from_str(json).unwrap();
        assert_eq!(movie.id, 550);
        assert_eq!(movie.genres.len(), 1);
        assert_eq!(movie.genres[0].id, 18);
        assert_eq!(movie.release_year(), Some(1999));
    }
}
