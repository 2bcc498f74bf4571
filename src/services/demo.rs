use anyhow::{Context, Result, anyhow};
use log::info;

use crate::config::settings::AppConfig;
use crate::domain::{ItemId, Respondent};
use crate::panel::PanelRepository;
use crate::prediction::{PredictionEngine, classify};

/// Demonstration run: take a panel respondent by position and predict the
/// items they have not rated, printing prediction, confidence, and norm
/// class for each.
pub struct DemoService {
    config: AppConfig,
    position: usize,
    item: Option<String>,
}

impl DemoService {
    pub fn new(config: AppConfig, position: usize, item: Option<String>) -> Self {
        Self {
            config,
            position,
            item,
        }
    }

    pub fn run(&self) -> Result<()> {
        let data_path =
            std::env::var("PANEL_DATA_PATH").unwrap_or_else(|_| "main_data.csv".to_string());

        let panel = PanelRepository::load(&data_path, &self.config.panel)
            .context("Failed to load the panel dataset")?;
        let engine = PredictionEngine::new(panel, self.config.engine.clone());

        let respondent = engine
            .panel()
            .respondent_at(self.position)
            .ok_or_else(|| anyhow!("no panel respondent at position {}", self.position))?
            .clone();
        info!(
            "Predicting for panel respondent at position {} ({} known ratings)",
            self.position,
            respondent.rating_count()
        );

        let targets: Vec<ItemId> = match &self.item {
            Some(item) => vec![item.clone()],
            None => engine
                .panel()
                .item_ids()
                .iter()
                .filter(|item| !respondent.has_rating(item.as_str()))
                .cloned()
                .collect(),
        };

        for item in targets {
            self.print_prediction(&engine, &respondent, &item);
        }
        Ok(())
    }

    fn print_prediction(&self, engine: &PredictionEngine, query: &Respondent, item: &str) {
        let rho = self.config.prediction.rho;
        let mu = self.config.prediction.mu;
        match engine.predict(query, item, rho, mu) {
            Ok(p) => println!(
                "{item}: prediction {:.2}, confidence {:.2} -> {}",
                p.value,
                p.confidence,
                classify(p.value, p.confidence).as_str()
            ),
            Err(e) => println!("{item}: no prediction ({e})"),
        }
    }
}
