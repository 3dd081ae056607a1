use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A user's taste profile derived from their loan history
///
/// Each weight is the fraction of the user's total loans matching that genre
/// or author, so values lie in (0, 1]. A loan belongs to exactly one genre
/// but may credit several authors, which is why the author weights need not
/// sum to 1. Recomputed per request, never persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PreferenceVector {
    pub genres: HashMap<String, f64>,
    pub authors: HashMap<Uuid, f64>,
}

impl PreferenceVector {
    /// An empty vector means "no content signal", not an error
    pub fn is_empty(&self) -> bool {
        self.genres.is_empty() && self.authors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        assert!(PreferenceVector::default().is_empty());
    }

    #[test]
    fn test_non_empty_with_only_genres() {
        let mut prefs = PreferenceVector::default();
        prefs.genres.insert("Horror".to_string(), 1.0);
        assert!(!prefs.is_empty());
    }

    #[test]
    fn test_non_empty_with_only_authors() {
        let mut prefs = PreferenceVector::default();
        prefs.authors.insert(Uuid::new_v4(), 0.5);
        assert!(!prefs.is_empty());
    }
}
