pub mod config;
pub mod intelligence;
pub mod models;
pub mod pipeline;
pub mod reference;

pub use intelligence::{Analyzer, Recommender};
pub use models::{RecommendationResult, Report, TestItem};
pub use reference::ReferenceTable;
