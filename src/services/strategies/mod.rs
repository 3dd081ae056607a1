//! The four independent scoring strategies
//!
//! Each strategy reads catalog/loan data and produces candidate
//! (book, score, reason) triples; none of them mutates anything. Scores are
//! clamped into [0.0, 1.0] at generation time. Accumulation always walks its
//! inputs in sorted order so that floating-point sums, and therefore whole
//! candidate lists, are reproducible run to run.

pub mod collaborative;
pub mod content_based;
pub mod popularity;
pub mod trending;
