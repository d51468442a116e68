/**
 * CONFIGURATION KERNEL - Chargement YAML + surcharges d'environnement
 *
 * RÔLE : Lit `servmon.yaml` (chemin via SERVMON_CONFIG) et produit une
 * KernelConfig complète. Chaque section a ses valeurs par défaut.
 *
 * FONCTIONNEMENT :
 * - Fichier absent ou vide → défauts (port 3001, profil serveur)
 * - YAML invalide → warning + défauts
 * - SERVMON_PORT surcharge le port d'écoute
 */

use serde::{Deserialize, Serialize};
use servmon_engine::EngineConfig;
use std::path::Path;
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

pub const CONFIG_ENV: &str = "SERVMON_CONFIG";
pub const PORT_ENV: &str = "SERVMON_PORT";
pub const DEFAULT_CONFIG_PATH: &str = "servmon.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct KernelConfig {
    pub listen: ListenConf,
    pub simulation: SimulationConf,
    pub limits: LimitsConf,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ListenConf {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SimulationConf {
    pub tick_interval_ms: u64,
    pub housekeeping_interval_ms: u64,
    pub corrective_actions: bool,
    pub correction_delay_ms: u64,
    pub seed: Option<u64>, // None = entropie OS
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LimitsConf {
    pub alert_capacity: usize,
    pub log_capacity: usize,
    pub snapshot_alerts: usize,
    pub snapshot_logs: usize,
    pub history_size: usize,
}

impl Default for ListenConf {
    fn default() -> Self {
        Self { host: "0.0.0.0".into(), port: 3001 }
    }
}

impl Default for SimulationConf {
    fn default() -> Self {
        Self {
            tick_interval_ms: 2000,
            housekeeping_interval_ms: 10_000,
            corrective_actions: true,
            correction_delay_ms: 2000,
            seed: None,
        }
    }
}

impl Default for LimitsConf {
    fn default() -> Self {
        let server = EngineConfig::server();
        Self {
            alert_capacity: server.alert_capacity,
            log_capacity: server.log_capacity,
            snapshot_alerts: server.snapshot_alerts,
            snapshot_logs: server.snapshot_logs,
            history_size: server.history_size,
        }
    }
}

impl KernelConfig {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            alert_capacity: self.limits.alert_capacity,
            log_capacity: self.limits.log_capacity,
            snapshot_alerts: self.limits.snapshot_alerts,
            snapshot_logs: self.limits.snapshot_logs,
            history_size: self.limits.history_size,
            tick_interval_ms: self.simulation.tick_interval_ms,
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(raw) = std::env::var(PORT_ENV) {
            match raw.parse::<u16>() {
                Ok(port) => self.listen.port = port,
                Err(_) => warn!("{PORT_ENV}={raw} ignoré (port invalide)"),
            }
        }
    }
}

/// Lecture stricte : erreur si le fichier est illisible ou invalide
pub async fn read_config(path: &Path) -> Result<KernelConfig, ConfigError> {
    let txt = fs::read_to_string(path).await?;
    if txt.trim().is_empty() {
        return Ok(KernelConfig::default());
    }
    Ok(serde_yaml::from_str(&txt)?)
}

pub async fn load_config() -> KernelConfig {
    let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let mut cfg = load_config_from(Path::new(&path)).await;
    cfg.apply_env_overrides();
    cfg
}

pub async fn load_config_from(path: &Path) -> KernelConfig {
    if !path.exists() {
        info!("pas de {}, usage config par défaut", path.display());
        return KernelConfig::default();
    }
    read_config(path).await.unwrap_or_else(|e| {
        warn!("config {} rejetée: {e}", path.display());
        KernelConfig::default()
    })
}
