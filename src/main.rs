//! local-delivery - Store-radius delivery service
//!
//! This is the composition root that wires together all the components.

use local_delivery::adapters::inbound::ApiServer;
use local_delivery::adapters::outbound::{
    CachingGeocoder, DashMapNoticeStore, NominatimConfig, NominatimGeocoder,
    SqliteSettingsRepository,
};
use local_delivery::application::LocalDeliveryService;
use local_delivery::config::load_config;
use local_delivery::domain::ports::Geocoder;
use local_delivery::infrastructure::{shutdown_signal, ShutdownController};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::fmt::format::FmtSpan;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment
    let cfg = load_config()?;
    cfg.validate()?;

    // Setup logging
    let log_level = if cfg.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    let shipping_method = cfg.shipping_method();
    tracing::info!(
        "starting local-delivery listen={} policy={}",
        cfg.listen_addr,
        shipping_method.policy.as_str()
    );

    // ===== COMPOSITION ROOT =====
    // Wire up all adapters and services

    // 1. Create outbound adapters

    // Settings repository (SQLite)
    let settings_repo = Arc::new(SqliteSettingsRepository::open(&cfg.db_path)?);
    tracing::info!("settings database opened at {}", cfg.db_path);

    // Geocoder (Nominatim), optionally behind a DashMap cache
    let nominatim = NominatimGeocoder::new(NominatimConfig {
        base_url: cfg.geocoder_url.clone(),
        timeout: Duration::from_secs(cfg.geocoder_timeout_secs),
        user_agent: cfg.user_agent.clone(),
    })?;
    let geocoder: Arc<dyn Geocoder> = if cfg.geocode_cache_enabled {
        let cache = CachingGeocoder::new(
            Arc::new(nominatim),
            Duration::from_secs(cfg.geocode_cache_ttl_secs),
        );
        cache.start_gc(Duration::from_secs(cfg.geocode_cache_gc_interval_secs));
        tracing::info!(
            "geocode cache enabled ttl={}s",
            cfg.geocode_cache_ttl_secs
        );
        Arc::new(cache)
    } else {
        Arc::new(nominatim)
    };

    // Notice store (DashMap)
    let notices = Arc::new(DashMapNoticeStore::new());
    notices.start_gc(
        Duration::from_secs(cfg.notice_ttl_secs),
        Duration::from_secs(cfg.notice_gc_interval_secs),
    );

    // 2. Create application service
    let service = Arc::new(LocalDeliveryService::new(
        geocoder,
        settings_repo.clone(),
        settings_repo,
        notices,
        shipping_method,
    ));

    // 3. Resolve the store location
    let store_address = cfg.store_address();
    service
        .bootstrap_store_location(cfg.store_coordinate(), store_address.as_ref())
        .await?;

    // 4. Create inbound adapter and run
    let shutdown = ShutdownController::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    let server = ApiServer::new(cfg.listen_addr.clone(), service);
    server.run(shutdown).await
}
