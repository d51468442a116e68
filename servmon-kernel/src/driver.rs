/**
 * DRIVER - Boucles temporisées autour du moteur
 *
 * RÔLE : Fait avancer le moteur toutes les `tick_interval_ms`, diffuse le
 * snapshot au hub, planifie les corrections différées et ajoute un log de
 * maintenance toutes les `housekeeping_interval_ms`.
 *
 * CYCLE DE VIE : `Driver::start` retourne un handle ; `shutdown()` ou le
 * drop du handle annule toutes les tâches (ticks, maintenance, corrections).
 */

use servmon_engine::{Monitor, Resource};
use std::collections::HashMap;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::task::{self, JoinHandle};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::config::SimulationConf;
use crate::state::{new_state, Shared, SharedEngine};
use crate::ws::BroadcastHub;

/// Corrections différées, une tâche one-shot par ressource.
/// Une nouvelle violation avant l'échéance remplace la tâche en attente.
#[derive(Clone)]
pub struct CorrectionScheduler {
    engine: SharedEngine,
    delay: Duration,
    enabled: bool,
    pending: Shared<HashMap<Resource, JoinHandle<()>>>,
}

impl CorrectionScheduler {
    pub fn new(engine: SharedEngine, delay: Duration, enabled: bool) -> Self {
        Self { engine, delay, enabled, pending: new_state(HashMap::new()) }
    }

    pub fn schedule(&self, resource: Resource) {
        if !self.enabled || !resource.has_corrective_action() {
            return;
        }

        let engine = self.engine.clone();
        let delay = self.delay;
        let handle = task::spawn(async move {
            tokio::time::sleep(delay).await;
            engine.lock().apply_correction(resource);
        });

        if let Some(previous) = self.pending.lock().insert(resource, handle) {
            if !previous.is_finished() {
                debug!(%resource, "[driver] correction en attente remplacée");
            }
            previous.abort();
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().values().filter(|h| !h.is_finished()).count()
    }

    pub fn cancel_all(&self) {
        for (_, handle) in self.pending.lock().drain() {
            handle.abort();
        }
    }
}

pub struct Driver {
    tasks: Vec<JoinHandle<()>>,
    corrections: CorrectionScheduler,
}

impl Driver {
    pub fn start(engine: SharedEngine, hub: BroadcastHub, sim: &SimulationConf) -> Self {
        let corrections = CorrectionScheduler::new(
            engine.clone(),
            Duration::from_millis(sim.correction_delay_ms),
            sim.corrective_actions,
        );

        let tick_task = spawn_tick_loop(
            engine.clone(),
            hub,
            corrections.clone(),
            Duration::from_millis(sim.tick_interval_ms.max(1)),
        );
        let housekeeping_task =
            spawn_housekeeping_loop(engine, Duration::from_millis(sim.housekeeping_interval_ms.max(1)));

        info!(
            tick_ms = sim.tick_interval_ms,
            housekeeping_ms = sim.housekeeping_interval_ms,
            corrective_actions = sim.corrective_actions,
            "[driver] démarré"
        );

        Self { tasks: vec![tick_task, housekeeping_task], corrections }
    }

    pub fn shutdown(self) {
        // le travail est fait par Drop
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        for handle in self.tasks.drain(..) {
            handle.abort();
        }
        self.corrections.cancel_all();
        info!("[driver] arrêté");
    }
}

fn spawn_tick_loop(
    engine: SharedEngine,
    hub: BroadcastHub,
    corrections: CorrectionScheduler,
    period: Duration,
) -> JoinHandle<()> {
    task::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        interval.tick().await; // le premier tick est immédiat

        loop {
            interval.tick().await;

            let (snapshot, report) = {
                let mut engine = engine.lock();
                let report = engine.tick_at(OffsetDateTime::now_utc());
                (engine.snapshot(), report)
            };

            let reached = hub.publish(&snapshot);
            debug!(
                clients = reached,
                breaches = report.breaches.len(),
                injected_alert = report.injected_alert,
                injected_log = report.injected_log,
                "[driver] tick"
            );

            for breach in &report.breaches {
                corrections.schedule(breach.resource);
            }
            if !report.breaches.is_empty() {
                debug!(pending = corrections.pending_count(), "[driver] corrections planifiées");
            }
        }
    })
}

fn spawn_housekeeping_loop(engine: SharedEngine, period: Duration) -> JoinHandle<()> {
    task::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        interval.tick().await;

        loop {
            interval.tick().await;
            engine.lock().record_housekeeping_log();
        }
    })
}
