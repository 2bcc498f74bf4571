/// Neighbor selection thresholds for the prediction engine.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Maximum distance between two respondents for them to be
    /// considered similar.
    pub max_distance: f64,
    /// Minimum number of commonly rated items before a distance is
    /// considered meaningful.
    pub min_common: usize,
    /// Minimum number of similar respondents required before
    /// aggregating a prediction.
    pub min_neighbors: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_distance: 0.0,
            min_common: 5,
            min_neighbors: 5,
        }
    }
}

/// Weights of the two confidence penalty terms.
#[derive(Debug, Clone)]
pub struct PredictionSettings {
    /// Weight of the neighbor-dissimilarity penalty.
    pub rho: f64,
    /// Weight of the neighbor-disagreement penalty.
    pub mu: f64,
}

impl Default for PredictionSettings {
    fn default() -> Self {
        Self { rho: 0.5, mu: 0.5 }
    }
}

/// Shape of the panel source table.
#[derive(Debug, Clone)]
pub struct PanelSettings {
    /// Question numbers at or above this are demographic, not
    /// preference items.
    pub demographic_cutoff: u32,
    /// Respondent rows with known-corrupt data, excluded at load.
    pub excluded_respondents: &'static [u32],
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            demographic_cutoff: 148,
            excluded_respondents: &[168, 204, 218, 322, 795, 1124, 1153, 1154, 1240, 1445],
        }
    }
}

/// Interactive survey session shape.
#[derive(Debug, Clone)]
pub struct SurveySettings {
    /// Items asked of the visitor per session.
    pub questions_per_session: usize,
    /// Predictions generated per session.
    pub predictions_per_session: usize,
}

impl Default for SurveySettings {
    fn default() -> Self {
        Self {
            questions_per_session: 5,
            predictions_per_session: 3,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub engine: EngineSettings,
    pub prediction: PredictionSettings,
    pub panel: PanelSettings,
    pub survey: SurveySettings,
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }
}
