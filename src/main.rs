use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

mod catalog;
mod config;
mod dashboard;
mod fantasy;
mod results;
mod snapshot;
mod store;

use catalog::EventCatalog;
use config::Config;
use dashboard::AppState;
use fantasy::SelectionValidator;
use results::{HttpSource, ResultSource};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();
    config.validate()?;

    let catalog = EventCatalog::new(store::load_catalog(&config.catalog_path)?);
    let confirmed = store::load_confirmed(&config.confirmed_path)?;
    let league = store::load_league(&config.league_path)?;

    let source: Option<HttpSource> = if config.skip_scrape {
        info!("Scrape disabled – using confirmed results only");
        None
    } else {
        Some(HttpSource::new(
            &config.source_url,
            Duration::from_secs(config.fetch_timeout_secs),
        )?)
    };

    let reconciled = results::refresh(
        &catalog,
        &confirmed,
        source.as_ref().map(|s| s as &dyn ResultSource),
        config.min_source_len,
    )
    .await;
    let snapshot = snapshot::build(&league, &catalog, reconciled, config.base_pick_cap);

    if config.once {
        let json = serde_json::to_string_pretty(&snapshot).context("Failed to encode snapshot")?;
        println!("{}", json);
        return Ok(());
    }

    let state = AppState {
        snapshot: Arc::new(snapshot),
        catalog: Arc::new(catalog),
        league: Arc::new(league),
        validator: SelectionValidator::new(config.deadline_policy(), config.base_pick_cap),
    };
    let app = dashboard::router(state);
    let addr: SocketAddr = config.dashboard_addr.parse()?;
    info!("Dashboard listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
