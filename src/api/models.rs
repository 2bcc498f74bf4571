use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionEntry {
    pub item: String,
    pub prompt: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionsResponse {
    pub uid: u64,
    pub questions: Vec<QuestionEntry>,
}

/// One predicted item. `prediction` and `confidence` are absent when the
/// panel could not support a prediction for the item, in which case
/// `norm` is "unknown".
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionEntry {
    pub item: String,
    pub prompt: String,
    pub prediction: Option<f64>,
    pub confidence: Option<f64>,
    pub norm: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionsResponse {
    pub uid: u64,
    pub predictions: Vec<PredictionEntry>,
}
