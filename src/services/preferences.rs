use std::collections::HashMap;
use uuid::Uuid;

use crate::models::{LoanRecord, PreferenceVector};

/// Derives a user's taste profile from their loan history
///
/// Groups loans by genre and by each book's authors, then weights every
/// group by its share of the total loan count. Both maps use the same
/// denominator, so genre and author weights are directly comparable
/// contribution fractions rather than independent distributions.
///
/// An empty history yields an empty vector, which callers treat as "no
/// content signal" rather than an error.
pub fn extract(loans: &[LoanRecord]) -> PreferenceVector {
    let mut preferences = PreferenceVector::default();

    let total = loans.len();
    if total == 0 {
        return preferences;
    }

    let mut genre_counts: HashMap<String, usize> = HashMap::new();
    let mut author_counts: HashMap<Uuid, usize> = HashMap::new();

    for loan in loans {
        if let Some(genre) = &loan.genre {
            *genre_counts.entry(genre.clone()).or_default() += 1;
        }
        for author_id in &loan.author_ids {
            *author_counts.entry(*author_id).or_default() += 1;
        }
    }

    for (genre, count) in genre_counts {
        preferences
            .genres
            .insert(genre, count as f64 / total as f64);
    }
    for (author_id, count) in author_counts {
        preferences
            .authors
            .insert(author_id, count as f64 / total as f64);
    }

    preferences
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn loan(genre: Option<&str>, author_ids: Vec<Uuid>) -> LoanRecord {
        LoanRecord {
            book_id: Uuid::new_v4(),
            borrower_id: Some("alice".to_string()),
            genre: genre.map(String::from),
            author_ids,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_history_yields_empty_vector() {
        let prefs = extract(&[]);
        assert!(prefs.is_empty());
    }

    #[test]
    fn test_single_genre_full_weight() {
        let loans = vec![loan(Some("Horror"), vec![]), loan(Some("Horror"), vec![])];
        let prefs = extract(&loans);
        assert_eq!(prefs.genres.get("Horror"), Some(&1.0));
        assert!(prefs.authors.is_empty());
    }

    #[test]
    fn test_genre_weights_are_loan_fractions() {
        let loans = vec![
            loan(Some("Horror"), vec![]),
            loan(Some("Horror"), vec![]),
            loan(Some("Romance"), vec![]),
            loan(None, vec![]),
        ];
        let prefs = extract(&loans);
        assert_eq!(prefs.genres.get("Horror"), Some(&0.5));
        assert_eq!(prefs.genres.get("Romance"), Some(&0.25));
        // Genreless loans still count toward the denominator
        assert_eq!(prefs.genres.len(), 2);
    }

    #[test]
    fn test_multi_author_loans_credit_each_author() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let loans = vec![loan(Some("SciFi"), vec![a, b]), loan(Some("SciFi"), vec![a])];
        let prefs = extract(&loans);

        assert_eq!(prefs.authors.get(&a), Some(&1.0));
        assert_eq!(prefs.authors.get(&b), Some(&0.5));
        // Author weights may sum past 1.0; genre weights may not
        let genre_sum: f64 = prefs.genres.values().sum();
        assert!(genre_sum <= 1.0 + f64::EPSILON);
    }
}
