use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::config::EngineTuning;
use crate::error::AppResult;
use crate::models::{Candidate, PreferenceVector, RecommendationType};
use crate::stores::CatalogStore;

const REASON: &str = "Based on your reading preferences for genres and authors";

/// Scores catalog books against the user's genre and author preferences
///
/// Every book in a preferred genre gains the genre's preference weight times
/// 0.6; every book by a preferred author gains the author's weight times 0.4.
/// Genre outweighs author
/// because the genre of a loan is a stronger taste signal in this model.
/// Books the user has already borrowed are excluded before scoring.
pub async fn score(
    catalog: &dyn CatalogStore,
    preferences: &PreferenceVector,
    user_books: &HashSet<Uuid>,
    tuning: &EngineTuning,
    limit: usize,
) -> AppResult<Vec<Candidate>> {
    if preferences.is_empty() {
        return Ok(Vec::new());
    }

    let mut book_scores: HashMap<Uuid, f64> = HashMap::new();

    let mut genres: Vec<&String> = preferences.genres.keys().collect();
    genres.sort();
    for genre in genres {
        let weight = preferences.genres[genre];
        for book in catalog.books_by_genre(genre).await? {
            if !user_books.contains(&book.id) {
                *book_scores.entry(book.id).or_default() += weight * tuning.genre_weight;
            }
        }
    }

    let mut authors: Vec<&Uuid> = preferences.authors.keys().collect();
    authors.sort();
    for author_id in authors {
        let weight = preferences.authors[author_id];
        // An author deleted since the loans were recorded is silently skipped
        let Some(author) = catalog.author_by_id(*author_id).await? else {
            continue;
        };
        for book_id in author.book_ids {
            if !user_books.contains(&book_id) {
                *book_scores.entry(book_id).or_default() += weight * tuning.author_weight;
            }
        }
    }

    let mut ranked: Vec<(Uuid, f64)> = book_scores.into_iter().collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    ranked.truncate(limit);

    let mut candidates = Vec::with_capacity(ranked.len());
    for (book_id, score) in ranked {
        if catalog.book_by_id(book_id).await?.is_some() {
            candidates.push(Candidate::clamped(
                book_id,
                score,
                REASON,
                RecommendationType::ContentBased,
            ));
        }
    }

    Ok(candidates)
}
