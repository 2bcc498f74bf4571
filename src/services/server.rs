use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use log::info;
use tower_http::cors::CorsLayer;

use crate::api::handlers::AppState;
use crate::api::routes::create_router;
use crate::config::settings::AppConfig;
use crate::panel::PanelRepository;
use crate::prediction::PredictionEngine;

pub struct ServerService {
    port: u16,
    config: AppConfig,
}

impl ServerService {
    pub fn new(port: u16, config: AppConfig) -> Self {
        Self { port, config }
    }

    pub async fn run(&self) -> Result<()> {
        let data_path =
            std::env::var("PANEL_DATA_PATH").unwrap_or_else(|_| "main_data.csv".to_string());

        let panel = PanelRepository::load(&data_path, &self.config.panel)?;
        let engine = PredictionEngine::new(panel, self.config.engine.clone());

        let state = Arc::new(AppState::new(engine, self.config.clone()));

        let app = create_router(state).layer(CorsLayer::permissive());

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        info!("Server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}
