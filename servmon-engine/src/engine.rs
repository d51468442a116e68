//! The simulation engine
//!
//! `SimulationEngine` owns every piece of monitoring state (metrics, history,
//! alerts, logs, thresholds). Consumers talk to it through the `Monitor`
//! trait and only ever receive cloned snapshots; the only mutations they can
//! request are alert acknowledgement and threshold updates.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::debug;

use crate::error::EngineError;
use crate::feed::Feed;
use crate::history::{History, DEFAULT_HISTORY_SIZE};
use crate::ids::IdAllocator;
use crate::models::{
    Alert, LogEntry, LogLevel, Metrics, Resource, Severity, Snapshot, Suggestion, Thresholds,
    ThresholdsUpdate,
};
use crate::seed::{self, pick};
use crate::signal;
use crate::suggestions::optimization_suggestions;
use crate::thresholds::{evaluate_breaches, optimization_actions, Breach, GENERIC_OPTIMIZATION};

const RANDOM_ALERT_PROBABILITY: f64 = 0.02;
const RANDOM_LOG_PROBABILITY: f64 = 0.05;
const CPU_CORRECTION_FACTOR: f64 = 0.8;
const MEMORY_CORRECTION_FACTOR: f64 = 0.9;
pub const DEFAULT_LOG_LIMIT: usize = 100;

/// Capability interface shared by every consumer of the engine
pub trait Monitor {
    /// Runs one tick and returns the resulting snapshot
    fn advance(&mut self) -> Snapshot;

    /// Latest snapshot without advancing
    fn snapshot(&self) -> Snapshot;

    /// One-way `acknowledged = true`; re-acknowledging is a no-op success
    fn acknowledge_alert(&mut self, id: u64) -> Result<(), EngineError>;

    fn optimization_suggestions(&self) -> Vec<Suggestion>;

    fn thresholds(&self) -> Thresholds;

    /// Applies only the fields present in `update`, returns the result
    fn update_thresholds(&mut self, update: ThresholdsUpdate) -> Thresholds;
}

/// Capacities and view limits of an engine instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub alert_capacity: usize,
    pub log_capacity: usize,
    /// Alerts included in a snapshot
    pub snapshot_alerts: usize,
    /// Logs included in a snapshot
    pub snapshot_logs: usize,
    pub history_size: usize,
    /// Spacing of the backdated samples used to pre-fill the history
    pub tick_interval_ms: u64,
}

impl EngineConfig {
    /// Profile of the in-process dashboard generator
    pub fn dashboard() -> Self {
        Self {
            alert_capacity: 50,
            log_capacity: 500,
            snapshot_alerts: 20,
            snapshot_logs: 100,
            history_size: DEFAULT_HISTORY_SIZE,
            tick_interval_ms: 2000,
        }
    }

    /// Profile of the networked server (push channel and `/api/metrics`)
    pub fn server() -> Self {
        Self {
            alert_capacity: 100,
            log_capacity: 1000,
            snapshot_alerts: 10,
            snapshot_logs: 50,
            ..Self::dashboard()
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::dashboard()
    }
}

/// Log query: optional level (case-insensitive) and result limit
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogFilter {
    pub level: Option<String>,
    pub limit: Option<usize>,
}

/// What happened during one tick
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub breaches: Vec<Breach>,
    pub injected_alert: bool,
    pub injected_log: bool,
}

/// Counters exposed for health reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStats {
    pub ticks: u64,
    pub alerts: usize,
    pub unacknowledged_alerts: usize,
    pub logs: usize,
}

pub struct SimulationEngine {
    config: EngineConfig,
    metrics: Metrics,
    history: History,
    alerts: Feed<Alert>,
    logs: Feed<LogEntry>,
    thresholds: Thresholds,
    ticks: u64,
    ids: IdAllocator,
    rng: StdRng,
}

impl SimulationEngine {
    /// Engine seeded from OS entropy
    pub fn new(config: EngineConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Deterministic engine for tests and reproducible demos
    pub fn with_seed(config: EngineConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(config: EngineConfig, rng: StdRng) -> Self {
        Self::initialize_at(config, rng, OffsetDateTime::now_utc())
    }

    /// Builds the initial state as of `now`: baseline metrics, backdated
    /// alerts and logs, and a history pre-filled with `history_size` samples.
    pub fn initialize_at(config: EngineConfig, mut rng: StdRng, now: OffsetDateTime) -> Self {
        let mut ids = IdAllocator::default();
        let metrics = Metrics::baseline(signal::roll_processes(&mut rng));
        let alerts = seed::backdated_alerts(&mut rng, &mut ids, now);
        let logs = seed::backdated_logs(&mut rng, &mut ids, now);

        let mut engine = Self {
            config,
            metrics,
            history: History::with_capacity(config.history_size),
            alerts: Feed::from_newest_first(alerts, config.alert_capacity),
            logs: Feed::from_newest_first(logs, config.log_capacity),
            thresholds: Thresholds::default(),
            ticks: 0,
            ids,
            rng,
        };
        engine.prefill_history(now);
        engine
    }

    // Metric evolution only: no thresholds, no random injections
    fn prefill_history(&mut self, now: OffsetDateTime) {
        let interval = self.config.tick_interval_ms as i64;
        for step in (0..self.config.history_size as i64).rev() {
            let at = unix_millis(now) - step * interval;
            signal::evolve(&mut self.metrics, at, &mut self.rng);
            self.history.record(at, &self.metrics);
        }
    }

    /// One tick at wall-clock time `now`. Randomly injected alerts are not
    /// echoed to the log feed; only breach alerts are.
    pub fn tick_at(&mut self, now: OffsetDateTime) -> TickReport {
        let now_ms = unix_millis(now);
        signal::evolve(&mut self.metrics, now_ms, &mut self.rng);
        self.history.record(now_ms, &self.metrics);
        self.ticks += 1;

        let breaches = self.evaluate_thresholds_at(now);

        let injected_alert = self.rng.gen_bool(RANDOM_ALERT_PROBABILITY);
        if injected_alert {
            let (title, message, severity) = *pick(&mut self.rng, &seed::RANDOM_ALERTS);
            self.push_alert(title, message.to_string(), severity, now);
        }

        let injected_log = self.rng.gen_bool(RANDOM_LOG_PROBABILITY);
        if injected_log {
            let level = *pick(&mut self.rng, &seed::RANDOM_LOG_LEVELS);
            let message = *pick(&mut self.rng, &seed::RANDOM_LOG_MESSAGES);
            self.push_log(level, message.to_string(), now);
        }

        TickReport { breaches, injected_alert, injected_log }
    }

    pub fn advance_at(&mut self, now: OffsetDateTime) -> Snapshot {
        self.tick_at(now);
        self.snapshot()
    }

    /// Threshold step of a tick: one alert, its log echo and one INFO
    /// optimization line per breach.
    pub fn evaluate_thresholds_at(&mut self, now: OffsetDateTime) -> Vec<Breach> {
        let breaches = evaluate_breaches(&self.metrics, &self.thresholds);

        for breach in &breaches {
            debug!(
                resource = %breach.resource,
                value = breach.value,
                threshold = breach.threshold,
                "threshold breach"
            );
            self.push_alert(breach.title, breach.message.clone(), breach.severity, now);
            self.push_log(
                breach.severity.log_level(),
                format!("ALERT: {} - {}", breach.title, breach.message),
                now,
            );

            let actions = optimization_actions(breach.resource);
            let action = if actions.is_empty() {
                GENERIC_OPTIMIZATION
            } else {
                *pick(&mut self.rng, actions)
            };
            self.push_log(
                LogLevel::Info,
                format!("OPTIMIZATION: {} for {} threshold breach", action, breach.resource),
                now,
            );
        }

        breaches
    }

    /// Deferred corrective effect of an optimization. Returns false when the
    /// resource has no corrective effect.
    pub fn apply_correction(&mut self, resource: Resource) -> bool {
        match resource {
            Resource::Cpu => {
                self.metrics.cpu.usage *= CPU_CORRECTION_FACTOR;
            }
            Resource::Memory => {
                self.metrics.memory.used *= MEMORY_CORRECTION_FACTOR;
                self.metrics.memory.sync_available();
            }
            _ => return false,
        }
        debug!(%resource, "applied corrective action");
        true
    }

    pub fn record_housekeeping_log(&mut self) {
        self.record_housekeeping_log_at(OffsetDateTime::now_utc());
    }

    pub fn record_housekeeping_log_at(&mut self, now: OffsetDateTime) {
        let message = *pick(&mut self.rng, &seed::HOUSEKEEPING_MESSAGES);
        self.push_log(LogLevel::Info, message.to_string(), now);
    }

    fn push_alert(&mut self, title: &str, message: String, severity: Severity, now: OffsetDateTime) {
        self.alerts.push_newest(Alert {
            id: self.ids.next(now),
            title: title.to_string(),
            message,
            severity,
            timestamp: now,
            acknowledged: false,
        });
    }

    fn push_log(&mut self, level: LogLevel, message: String, now: OffsetDateTime) {
        self.logs.push_newest(LogEntry {
            id: self.ids.next(now),
            timestamp: now,
            level,
            message,
        });
    }

    /// Sets metrics from outside the simulation (tooling, scenarios).
    /// `memory.available` is kept consistent with `memory.used`.
    pub fn force_metrics<F: FnOnce(&mut Metrics)>(&mut self, mutate: F) {
        mutate(&mut self.metrics);
        self.metrics.memory.sync_available();
    }

    pub fn snapshot_with_limits(&self, alerts: usize, logs: usize) -> Snapshot {
        Snapshot {
            metrics: self.metrics.clone(),
            history: self.history.clone(),
            alerts: self.alerts.head(alerts),
            logs: self.logs.head(logs),
        }
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Full alert list, newest first
    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.to_vec()
    }

    /// Logs newest first, filtered by level then limited. An unknown level
    /// matches nothing.
    pub fn logs(&self, filter: &LogFilter) -> Vec<LogEntry> {
        let limit = filter.limit.unwrap_or(DEFAULT_LOG_LIMIT);
        let level = match filter.level.as_deref().filter(|l| !l.is_empty()) {
            None => None,
            Some(raw) => match raw.parse::<LogLevel>() {
                Ok(level) => Some(level),
                Err(_) => return Vec::new(),
            },
        };

        self.logs
            .iter()
            .filter(|entry| level.map_or(true, |l| entry.level == l))
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            ticks: self.ticks,
            alerts: self.alerts.len(),
            unacknowledged_alerts: self.alerts.iter().filter(|a| !a.acknowledged).count(),
            logs: self.logs.len(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl Monitor for SimulationEngine {
    fn advance(&mut self) -> Snapshot {
        self.advance_at(OffsetDateTime::now_utc())
    }

    fn snapshot(&self) -> Snapshot {
        self.snapshot_with_limits(self.config.snapshot_alerts, self.config.snapshot_logs)
    }

    fn acknowledge_alert(&mut self, id: u64) -> Result<(), EngineError> {
        let alert = self
            .alerts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(EngineError::AlertNotFound(id))?;
        alert.acknowledged = true;
        Ok(())
    }

    fn optimization_suggestions(&self) -> Vec<Suggestion> {
        optimization_suggestions(&self.metrics)
    }

    fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    fn update_thresholds(&mut self, update: ThresholdsUpdate) -> Thresholds {
        self.thresholds.apply(&update);
        self.thresholds
    }
}

fn unix_millis(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PROCESS_NAMES;
    use time::macros::datetime;
    use time::Duration;

    const START: OffsetDateTime = datetime!(2025-03-10 08:00 UTC);

    fn engine(seed: u64) -> SimulationEngine {
        SimulationEngine::initialize_at(EngineConfig::dashboard(), StdRng::seed_from_u64(seed), START)
    }

    fn calm(engine: &mut SimulationEngine) {
        engine.force_metrics(|m| {
            m.cpu.usage = 40.0;
            m.cpu.temperature = 55.0;
            m.memory.used = 8000.0;
        });
    }

    #[test]
    fn test_initial_state() {
        let engine = engine(1);
        let snapshot = engine.snapshot();

        assert_eq!(engine.history().cpu.len(), 50);
        assert_eq!(engine.history().network.len(), 50);
        assert_eq!(engine.alerts().len(), 12);
        assert_eq!(engine.logs(&LogFilter { limit: Some(1000), ..Default::default() }).len(), 200);
        assert_eq!(snapshot.alerts.len(), 12);
        assert_eq!(snapshot.logs.len(), 100);
        assert_eq!(snapshot.metrics.processes.len(), 8);
        assert_eq!(engine.thresholds(), Thresholds::default());

        let last = engine.history().cpu.back().unwrap();
        assert_eq!(last.time, unix_millis(START));
    }

    #[test]
    fn test_invariants_hold_across_ticks() {
        let mut engine = engine(2);
        let mut now = START;
        let mut previous = engine.metrics().clone();

        for _ in 0..300 {
            now += Duration::seconds(2);
            let snapshot = engine.advance_at(now);
            let m = &snapshot.metrics;

            assert_eq!(m.memory.available, m.memory.total - m.memory.used);
            assert!((5.0..=95.0).contains(&m.cpu.usage));
            assert!(m.disk.used >= previous.disk.used);
            assert!(m.network.bytes_in >= previous.network.bytes_in);
            assert!(m.network.bytes_out >= previous.network.bytes_out);
            assert_eq!(m.processes.len(), 8);
            for (slot, p) in m.processes.iter().enumerate() {
                assert_eq!(p.pid, 1000 + slot as u32);
                assert_eq!(p.name, PROCESS_NAMES[slot]);
                assert!(p.cpu >= 0.0 && p.cpu < 15.0);
                assert!(p.memory >= 0.0 && p.memory < 500.0);
            }

            assert!(snapshot.history.cpu.len() <= 50);
            assert!(engine.stats().alerts <= 50);
            assert!(engine.stats().logs <= 500);
            previous = m.clone();
        }

        let history = engine.history();
        assert_eq!(history.cpu.back().unwrap().time, unix_millis(now));
        for pair in history.cpu.iter().collect::<Vec<_>>().windows(2) {
            assert!(pair[0].time < pair[1].time);
        }
        assert_eq!(engine.stats().ticks, 300);
    }

    #[test]
    fn test_feeds_stay_newest_first() {
        let mut engine = engine(3);
        let mut now = START;
        engine.update_thresholds(ThresholdsUpdate { cpu: Some(0.0), ..Default::default() });

        // every tick breaches: at least two logs per tick, so the 200 seeded
        // logs are evicted well before the end
        for _ in 0..300 {
            now += Duration::seconds(2);
            engine.tick_at(now);
        }

        let alerts = engine.alerts();
        assert_eq!(alerts.len(), 50);
        for pair in alerts.windows(2) {
            assert!(pair[0].timestamp >= pair[1].timestamp);
            assert!(pair[0].id > pair[1].id);
        }
        assert_eq!(alerts[0].timestamp, now);

        let logs = engine.logs(&LogFilter { limit: Some(usize::MAX), ..Default::default() });
        assert_eq!(logs.len(), 500);
        for pair in logs.windows(2) {
            assert!(pair[0].timestamp >= pair[1].timestamp);
            assert!(pair[0].id > pair[1].id);
        }
        assert_eq!(logs[0].timestamp, now);
        assert!(logs.iter().all(|l| l.timestamp > START));
    }

    #[test]
    fn test_random_alerts_are_not_echoed() {
        let mut engine = engine(14);
        let mut now = START;
        // no breach can happen, only random injections touch the feeds
        engine.update_thresholds(ThresholdsUpdate {
            cpu: Some(1000.0),
            memory: Some(1000.0),
            disk: Some(1000.0),
            temperature: Some(1000.0),
        });

        let mut injected_alerts = 0;
        for _ in 0..2000 {
            now += Duration::seconds(2);
            let logs_before = engine.stats().logs;

            let report = engine.tick_at(now);
            assert!(report.breaches.is_empty());
            assert_eq!(report.injected_alert, engine.alerts()[0].timestamp == now);
            if report.injected_alert {
                injected_alerts += 1;
            }
            if !report.injected_log {
                assert_eq!(engine.stats().logs, logs_before);
            }
        }

        assert!(injected_alerts > 0);
        let logs = engine.logs(&LogFilter { limit: Some(usize::MAX), ..Default::default() });
        assert!(logs.iter().all(|l| !l.message.starts_with("ALERT: ")));
    }

    #[test]
    fn test_cpu_breach_scenario() {
        let mut engine = engine(4);
        calm(&mut engine);
        engine.force_metrics(|m| m.cpu.usage = 96.0);

        let alerts_before = engine.alerts();
        let logs_before = engine.logs(&LogFilter { limit: Some(usize::MAX), ..Default::default() });
        let now = START + Duration::seconds(1);

        let breaches = engine.evaluate_thresholds_at(now);
        assert_eq!(breaches.len(), 1);

        let alerts = engine.alerts();
        assert_eq!(alerts.len(), alerts_before.len() + 1);
        assert_eq!(alerts[0].title, "High CPU Usage");
        assert_eq!(alerts[0].severity, Severity::Warning);
        assert!(!alerts[0].acknowledged);
        assert_eq!(&alerts[1..], &alerts_before[..]);

        let logs = engine.logs(&LogFilter { limit: Some(usize::MAX), ..Default::default() });
        let new_logs = &logs[..logs.len() - logs_before.len()];
        let info: Vec<&LogEntry> = new_logs.iter().filter(|l| l.level == LogLevel::Info).collect();
        assert_eq!(info.len(), 1);
        assert!(info[0].message.starts_with("OPTIMIZATION: "));
        assert!(info[0].message.ends_with("for cpu threshold breach"));
        assert!(optimization_actions(Resource::Cpu)
            .iter()
            .any(|a| info[0].message.contains(a)));
    }

    #[test]
    fn test_temperature_breach_uses_generic_action() {
        let mut engine = engine(5);
        calm(&mut engine);
        engine.force_metrics(|m| m.cpu.temperature = 90.0);

        let breaches = engine.evaluate_thresholds_at(START);
        assert_eq!(breaches[0].resource, Resource::Temperature);
        assert_eq!(engine.alerts()[0].severity, Severity::Error);

        let latest = engine.logs(&LogFilter { limit: Some(2), ..Default::default() });
        assert_eq!(latest[0].message, "OPTIMIZATION: Generic optimization for temperature threshold breach");
        assert_eq!(latest[1].level, LogLevel::Error);
        assert!(latest[1].message.starts_with("ALERT: High Temperature"));
    }

    #[test]
    fn test_acknowledge_alert() {
        let mut engine = engine(6);
        let before = engine.alerts();
        let target = before[3].id;

        engine.acknowledge_alert(target).unwrap();
        let after = engine.alerts();
        assert!(after[3].acknowledged);
        for (i, (a, b)) in before.iter().zip(after.iter()).enumerate() {
            if i != 3 {
                assert_eq!(a, b);
            }
        }

        // idempotent
        assert_eq!(engine.acknowledge_alert(target), Ok(()));
        assert_eq!(engine.alerts(), after);
    }

    #[test]
    fn test_acknowledge_unknown_alert() {
        let mut engine = engine(7);
        let before = engine.alerts();

        assert_eq!(engine.acknowledge_alert(42), Err(EngineError::AlertNotFound(42)));
        assert_eq!(engine.alerts(), before);
    }

    #[test]
    fn test_suggestions_are_pure() {
        let mut engine = engine(8);
        engine.tick_at(START + Duration::seconds(2));

        assert_eq!(engine.optimization_suggestions(), engine.optimization_suggestions());

        calm(&mut engine);
        assert_eq!(engine.optimization_suggestions().len(), 1);
    }

    #[test]
    fn test_update_thresholds_partial() {
        let mut engine = engine(9);
        let updated = engine.update_thresholds(ThresholdsUpdate { cpu: Some(50.0), ..Default::default() });

        assert_eq!(updated.cpu, 50.0);
        assert_eq!(updated.memory, 85.0);
        assert_eq!(updated.disk, 90.0);
        assert_eq!(updated.temperature, 75.0);
        assert_eq!(engine.thresholds(), updated);
    }

    #[test]
    fn test_corrections() {
        let mut engine = engine(10);
        engine.force_metrics(|m| {
            m.cpu.usage = 90.0;
            m.memory.used = 10000.0;
        });

        assert!(engine.apply_correction(Resource::Cpu));
        assert!((engine.metrics().cpu.usage - 72.0).abs() < 1e-9);

        assert!(engine.apply_correction(Resource::Memory));
        let memory = &engine.metrics().memory;
        assert!((memory.used - 9000.0).abs() < 1e-9);
        assert_eq!(memory.available, memory.total - memory.used);

        assert!(!engine.apply_correction(Resource::Temperature));
    }

    #[test]
    fn test_log_filter() {
        let mut engine = engine(11);
        engine.record_housekeeping_log_at(START);

        let info = engine.logs(&LogFilter { level: Some("info".into()), limit: Some(10) });
        assert!(info.len() <= 10);
        assert!(info.iter().all(|l| l.level == LogLevel::Info));
        assert!(seed::HOUSEKEEPING_MESSAGES.contains(&info[0].message.as_str()));

        let unknown = engine.logs(&LogFilter { level: Some("verbose".into()), limit: None });
        assert!(unknown.is_empty());

        assert_eq!(engine.logs(&LogFilter::default()).len(), DEFAULT_LOG_LIMIT);
    }

    #[test]
    fn test_same_seed_same_simulation() {
        let mut a = engine(12);
        let mut b = engine(12);
        let now = START + Duration::seconds(2);

        assert_eq!(a.advance_at(now).metrics, b.advance_at(now).metrics);
        assert_eq!(a.alerts(), b.alerts());
    }

    #[test]
    fn test_server_profile_limits() {
        let engine = SimulationEngine::initialize_at(EngineConfig::server(), StdRng::seed_from_u64(13), START);
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.alerts.len(), 10);
        assert_eq!(snapshot.logs.len(), 50);
    }
}
