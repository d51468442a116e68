//! Canned catalogues and backdated seed data
//!
//! The engine starts with a populated alert and log feed so the dashboard
//! never opens on an empty screen. Timestamps are spread randomly over a
//! past window and the result is sorted newest-first.

use rand::seq::SliceRandom;
use rand::Rng;
use time::{Duration, OffsetDateTime};

use crate::ids::IdAllocator;
use crate::models::{Alert, LogEntry, LogLevel, Severity};

pub const SEED_ALERT_COUNT: usize = 12;
pub const SEED_LOG_COUNT: usize = 200;
pub const SEED_ALERT_WINDOW: Duration = Duration::days(7);
pub const SEED_LOG_WINDOW: Duration = Duration::days(3);
const SEED_ACKNOWLEDGED_PROBABILITY: f64 = 0.4;

/// (title, message, severity)
pub type AlertTemplate = (&'static str, &'static str, Severity);

pub const SEED_ALERTS: [AlertTemplate; 5] = [
    ("High CPU Usage", "CPU usage exceeded 80%", Severity::Warning),
    ("Memory Warning", "Memory usage is approaching limits", Severity::Warning),
    ("Disk Space Low", "Disk usage is above 85%", Severity::Error),
    ("Service Restart", "MySQL service was automatically restarted", Severity::Info),
    ("Security Alert", "Multiple failed login attempts detected", Severity::Error),
];

/// Injected at random during ticks, unrelated to thresholds
pub const RANDOM_ALERTS: [AlertTemplate; 3] = [
    ("Performance Alert", "System performance degraded", Severity::Warning),
    ("Resource Usage", "High resource utilization detected", Severity::Warning),
    ("Service Status", "Service health check completed", Severity::Info),
];

pub const SEED_LOG_MESSAGES: [&str; 18] = [
    "System health check completed successfully",
    "Backup process started for database",
    "Log rotation completed",
    "Security scan finished - no threats detected",
    "Database optimization complete",
    "Cache cleared successfully",
    "Service nginx reloaded",
    "Disk cleanup completed",
    "Memory optimization performed",
    "Network interface eth0 status: UP",
    "Firewall rules updated",
    "SSL certificate renewed",
    "User authentication successful",
    "Failed login attempt from 192.168.1.100",
    "System update available",
    "Monitoring agent started",
    "Performance metrics collected",
    "Alert threshold updated",
];

pub const RANDOM_LOG_MESSAGES: [&str; 4] = [
    "System monitoring update completed",
    "Performance metrics collected",
    "Cache optimization performed",
    "Network connectivity verified",
];

pub const RANDOM_LOG_LEVELS: [LogLevel; 2] = [LogLevel::Info, LogLevel::Debug];

pub const HOUSEKEEPING_MESSAGES: [&str; 5] = [
    "System health check completed",
    "Backup process started",
    "Log rotation completed",
    "Security scan finished",
    "Database optimization complete",
];

fn backdate<R: Rng + ?Sized>(rng: &mut R, now: OffsetDateTime, window: Duration) -> OffsetDateTime {
    let window_ms = window.whole_milliseconds().max(1) as i64;
    now - Duration::milliseconds(rng.gen_range(0..window_ms))
}

pub(crate) fn pick<'a, T, R: Rng + ?Sized>(rng: &mut R, items: &'a [T]) -> &'a T {
    // catalogues are non-empty constants
    items.choose(rng).unwrap_or(&items[0])
}

pub(crate) fn backdated_alerts<R: Rng + ?Sized>(
    rng: &mut R,
    ids: &mut IdAllocator,
    now: OffsetDateTime,
) -> Vec<Alert> {
    let mut alerts: Vec<Alert> = (0..SEED_ALERT_COUNT)
        .map(|_| {
            let (title, message, severity) = *pick(rng, &SEED_ALERTS);
            Alert {
                id: ids.next(now),
                title: title.to_string(),
                message: message.to_string(),
                severity,
                timestamp: backdate(rng, now, SEED_ALERT_WINDOW),
                acknowledged: rng.gen_bool(SEED_ACKNOWLEDGED_PROBABILITY),
            }
        })
        .collect();

    alerts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    alerts
}

pub(crate) fn backdated_logs<R: Rng + ?Sized>(
    rng: &mut R,
    ids: &mut IdAllocator,
    now: OffsetDateTime,
) -> Vec<LogEntry> {
    let mut logs: Vec<LogEntry> = (0..SEED_LOG_COUNT)
        .map(|_| {
            let level = *pick(rng, &LogLevel::ALL);
            let message = *pick(rng, &SEED_LOG_MESSAGES);
            LogEntry {
                id: ids.next(now),
                timestamp: backdate(rng, now, SEED_LOG_WINDOW),
                level,
                message: message.to_string(),
            }
        })
        .collect();

    logs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    logs
}
