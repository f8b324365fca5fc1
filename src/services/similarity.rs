use std::collections::{BTreeSet, HashMap};
use std::time::Instant;

use crate::models::{MovieFeatures, MovieId};

/// Weight of genre agreement in the combined score
pub const GENRE_WEIGHT: f64 = 0.6;
/// Weight of vote/popularity/year agreement in the combined score
pub const METRIC_WEIGHT: f64 = 0.4;

/// Jaccard index of two genre sets
///
/// Two empty sets carry no evidence of similarity and score 0.
pub fn jaccard(a: &BTreeSet<i64>, b: &BTreeSet<i64>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }

    a.intersection(b).count() as f64 / union as f64
}

pub fn euclidean_distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// `1 / (1 + d)` over the `[vote, popularity, year]` vectors; 1 at distance 0
pub fn metric_similarity(a: &MovieFeatures, b: &MovieFeatures) -> f64 {
    1.0 / (1.0 + euclidean_distance(&a.metric_vector(), &b.metric_vector()))
}

/// How alike two movies are, in `[0, 1]`
///
/// Weighted blend of genre overlap and closeness of the normalized metadata.
/// Symmetric in its arguments.
pub fn similarity(a: &MovieFeatures, b: &MovieFeatures) -> f64 {
    GENRE_WEIGHT * jaccard(&a.genres, &b.genres) + METRIC_WEIGHT * metric_similarity(a, b)
}

/// Precomputed pairwise similarity over a fixed set of movies
///
/// Rows and columns follow ascending movie id. Values are stored row-major and
/// mirrored, so `get(a, b) == get(b, a)` always holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimilarityMatrix {
    movie_ids: Vec<MovieId>,
    index: HashMap<MovieId, usize>,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    /// Evaluates [`similarity`] once per unordered pair and mirrors it
    pub fn build(features: &HashMap<MovieId, MovieFeatures>) -> Self {
        let start = Instant::now();

        let mut movie_ids: Vec<MovieId> = features.keys().copied().collect();
        movie_ids.sort_unstable();

        let n = movie_ids.len();
        let mut values = vec![0.0; n * n];

        for i in 0..n {
            let a = &features[&movie_ids[i]];
            for j in i..n {
                let b = &features[&movie_ids[j]];
                let score = similarity(a, b);
                values[i * n + j] = score;
                values[j * n + i] = score;
            }
        }

        let index = movie_ids
            .iter()
            .enumerate()
            .map(|(position, &id)| (id, position))
            .collect();

        tracing::debug!(
            movies = n,
            elapsed_us = start.elapsed().as_micros() as u64,
            "Similarity matrix built"
        );

        Self {
            movie_ids,
            index,
            values,
        }
    }

    /// Similarity between two movies, if both were present at build time
    pub fn get(&self, a: MovieId, b: MovieId) -> Option<f64> {
        let i = *self.index.get(&a)?;
        let j = *self.index.get(&b)?;
        Some(self.values[i * self.movie_ids.len() + j])
    }

    /// Movies covered by the matrix, ascending
    pub fn movie_ids(&self) -> &[MovieId] {
        &self.movie_ids
    }

    pub fn len(&self) -> usize {
        self.movie_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movie_ids.is_empty()
    }
}
