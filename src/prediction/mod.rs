pub mod engine;
pub mod norms;
pub mod similarity;

pub use engine::{Neighborhood, PredictionEngine};
pub use norms::{NormClass, classify};
pub use similarity::SimilarityCache;
