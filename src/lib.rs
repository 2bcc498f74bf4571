pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod panel;
pub mod prediction;
pub mod services;

use anyhow::Result;
use clap::Parser;
use cli::Cli;

use crate::cli::Command;
use crate::config::settings::AppConfig;
use crate::services::demo::DemoService;
use crate::services::server::ServerService;

pub fn interpret() -> Command {
    let cli = Cli::parse();
    cli.command
}

pub fn handle_serve(port: u16) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let config = AppConfig::new();
        let service = ServerService::new(port, config);
        service.run().await
    })
}

pub fn handle_predict(respondent: usize, item: Option<String>) -> Result<()> {
    let config = AppConfig::new();
    let service = DemoService::new(config, respondent, item);
    service.run()
}
