mod config;
mod db;
mod gateway;
mod models;
mod processor;
mod store;
mod ws;

use std::sync::Arc;

use config::AppConfig;
use db::{PgDirectory, PgTripStore};
use gateway::admission::AdmissionPipeline;
use gateway::presence::PresenceState;
use gateway::rooms::RoomRegistry;
use gateway::router::{EventRouter, TelemetrySink};
use gateway::session::SessionGateway;
use processor::trip_segmenter::TripSegmenter;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load config
    let config = AppConfig::load()?;

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .init();

    info!("Starting CosmicSail Gateway...");

    // Init DB
    let pool = db::init_pool(&config.database_url, config.db_max_connections).await?;
    info!("Connected to database");

    let directory = Arc::new(PgDirectory::new(pool.clone()));
    let rooms = Arc::new(RoomRegistry::default());
    let presence = Arc::new(PresenceState::default());

    let gateway = SessionGateway::new(
        AdmissionPipeline::new(directory.clone(), directory.clone()),
        rooms.clone(),
        presence,
    );

    let mut router = EventRouter::new(rooms);
    if config.persist_telemetry {
        let segmenter = Arc::new(TripSegmenter::new(Arc::new(PgTripStore::new(pool))));
        let sink = TelemetrySink::new(segmenter, directory, config.trip_timeout_minutes);
        router = router.with_telemetry(Arc::new(sink));
        info!(
            "Telemetry persistence enabled (trip timeout {} min)",
            config.trip_timeout_minutes
        );
    }

    let state = ws::AppState {
        gateway: Arc::new(gateway),
        router: Arc::new(router),
        socket_buffer: config.socket_buffer,
    };
    ws::serve(&config.listen_addr(), state).await
}
