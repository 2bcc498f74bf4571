pub mod settings;

pub use settings::{AppConfig, EngineSettings, PanelSettings, PredictionSettings, SurveySettings};
