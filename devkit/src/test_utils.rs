/*!
Test Harness pour le moteur servmon

Facilite l'écriture de tests avec:
- Moteur à graine fixe et horloge simulée (déterministe)
- Avance de N ticks à intervalle régulier
- Vérification des invariants après chaque étape
- Validation du snapshot contre le contrat `metrics_snapshot`
*/

use anyhow::{ensure, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;
use servmon_engine::models::PROCESS_PID_BASE;
use servmon_engine::{EngineConfig, Monitor, Snapshot, SimulationEngine, TickReport};
use time::{Duration, OffsetDateTime};

use crate::contract_helpers::ContractLoader;

/// Horloge de départ commune à tous les harness (2025-01-01T00:00:00Z)
pub const HARNESS_EPOCH_SECONDS: i64 = 1_735_689_600;

/// Harness de test complet pour le moteur
pub struct TestHarness {
    pub engine: SimulationEngine,
    pub contract_loader: ContractLoader,
    now: OffsetDateTime,
}

impl TestHarness {
    /// Crée un harness profil dashboard
    pub fn new(seed: u64) -> Self {
        Self::with_config(EngineConfig::dashboard(), seed)
    }

    pub fn with_config(config: EngineConfig, seed: u64) -> Self {
        env_logger::try_init().ok(); // Init logging pour tests

        let now = OffsetDateTime::from_unix_timestamp(HARNESS_EPOCH_SECONDS)
            .unwrap_or(OffsetDateTime::UNIX_EPOCH);
        Self {
            engine: SimulationEngine::initialize_at(config, StdRng::seed_from_u64(seed), now),
            contract_loader: ContractLoader::with_builtin_contracts(),
            now,
        }
    }

    pub fn now(&self) -> OffsetDateTime {
        self.now
    }

    /// Avance l'horloge simulée d'un intervalle puis exécute un tick
    pub fn tick(&mut self) -> TickReport {
        self.now += Duration::milliseconds(self.engine.config().tick_interval_ms as i64);
        self.engine.tick_at(self.now)
    }

    /// Exécute `count` ticks en vérifiant les invariants après chacun
    pub fn run_ticks(&mut self, count: usize) -> Result<Vec<TickReport>> {
        let mut reports = Vec::with_capacity(count);
        let mut previous = self.engine.metrics().clone();

        for step in 0..count {
            reports.push(self.tick());
            self.assert_invariants()?;

            let current = self.engine.metrics();
            ensure!(current.disk.used >= previous.disk.used, "tick {step}: disk.used decreased");
            ensure!(current.network.bytes_in >= previous.network.bytes_in, "tick {step}: bytesIn decreased");
            ensure!(current.network.bytes_out >= previous.network.bytes_out, "tick {step}: bytesOut decreased");
            previous = current.clone();
        }

        log::info!("🔁 Ran {} ticks ({} breaches)", count, reports.iter().map(|r| r.breaches.len()).sum::<usize>());
        Ok(reports)
    }

    /// Invariants valables à tout instant
    pub fn assert_invariants(&self) -> Result<()> {
        let metrics = self.engine.metrics();
        let config = self.engine.config();

        ensure!(
            metrics.memory.available == metrics.memory.total - metrics.memory.used,
            "memory.available out of sync"
        );
        ensure!(
            (5.0..=95.0).contains(&metrics.cpu.usage),
            "cpu usage {} out of [5, 95]",
            metrics.cpu.usage
        );
        ensure!(metrics.processes.len() == 8, "expected 8 processes");
        for (slot, process) in metrics.processes.iter().enumerate() {
            ensure!(process.pid == PROCESS_PID_BASE + slot as u32, "pid moved in slot {slot}");
        }

        let history = self.engine.history();
        for (name, len) in [
            ("cpu", history.cpu.len()),
            ("memory", history.memory.len()),
            ("disk", history.disk.len()),
            ("network", history.network.len()),
        ] {
            ensure!(len <= config.history_size, "history.{name} over capacity ({len})");
        }

        let alerts = self.engine.alerts();
        ensure!(alerts.len() <= config.alert_capacity, "alerts over capacity");
        ensure!(
            alerts.windows(2).all(|w| w[0].timestamp >= w[1].timestamp),
            "alerts not newest-first"
        );

        let stats = self.engine.stats();
        ensure!(stats.logs <= config.log_capacity, "logs over capacity");
        Ok(())
    }

    pub fn snapshot(&self) -> Snapshot {
        self.engine.snapshot()
    }

    pub fn snapshot_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self.engine.snapshot())?)
    }

    /// Valide le snapshot courant contre le contrat `metrics_snapshot`
    pub fn validate_snapshot(&self) -> Result<()> {
        let json = self.snapshot_json()?;
        self.contract_loader.validate("metrics_snapshot", &json)
    }
}
