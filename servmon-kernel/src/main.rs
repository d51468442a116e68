/**
 * SERVMON KERNEL - Point d'entrée du serveur de monitoring simulé
 *
 * RÔLE : Orchestration des modules : config, moteur, driver, HTTP, WebSocket.
 * Bootstrap complet avec logging tracing et arrêt propre sur Ctrl-C.
 *
 * ARCHITECTURE : un seul moteur (servmon-engine) partagé derrière un verrou ;
 * le driver le fait avancer, l'API REST et le hub WebSocket le lisent.
 */

mod config;
mod driver;
mod health;
mod http;
mod state;
mod ws;

use crate::config::load_config;
use crate::driver::Driver;
use crate::health::HealthTracker;
use crate::http::AppState;
use crate::state::new_state;
use crate::ws::BroadcastHub;

use anyhow::Context;
use servmon_engine::SimulationEngine;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "servmon_kernel=info,servmon_engine=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Charger les variables d'environnement depuis .env (si présent)
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = load_config().await;

    // moteur : graine fixe si configurée, sinon entropie OS
    let engine_config = cfg.engine_config();
    let engine = match cfg.simulation.seed {
        Some(seed) => SimulationEngine::with_seed(engine_config, seed),
        None => SimulationEngine::new(engine_config),
    };
    let engine = new_state(engine);
    info!(
        alerts = engine_config.alert_capacity,
        logs = engine_config.log_capacity,
        seeded = cfg.simulation.seed.is_some(),
        "[kernel] moteur initialisé"
    );

    let hub = BroadcastHub::default();
    let driver = Driver::start(engine.clone(), hub.clone(), &cfg.simulation);

    let app_state = AppState {
        engine,
        hub,
        health_tracker: HealthTracker::new(),
    };
    let app = http::build_router(app_state);

    let addr = format!("{}:{}", cfg.listen.host, cfg.listen.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!("[kernel] listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serveur HTTP")?;

    driver.shutdown();
    info!("[kernel] arrêt propre");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("[kernel] écoute Ctrl-C impossible: {e}");
        std::future::pending::<()>().await;
    }
    info!("[kernel] Ctrl-C reçu");
}
