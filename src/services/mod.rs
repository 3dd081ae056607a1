pub mod aggregate;
pub mod engine;
pub mod persist;
pub mod preferences;
pub mod similarity;
pub mod strategies;
