pub mod analysis;
pub mod classify;
pub mod features;
pub mod recommend;
pub mod specialist;

pub use analysis::{analyze_with_ranges, AnalysisError, Analyzer};
pub use classify::{classify_prediction, classify_value, PredictionClass};
pub use features::{attach_predictions, prepare_features, FeatureRow};
pub use recommend::{fallback_recommendations, Recommender};
pub use specialist::{
    SpecialistRule, SpecialistTable, RECOMMENDATION_SPECIALISTS, REPORT_SPECIALISTS,
};
