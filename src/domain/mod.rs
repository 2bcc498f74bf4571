pub mod models;

pub use models::{ItemId, Prediction, Rating, Respondent, RespondentId};
