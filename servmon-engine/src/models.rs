//! Data model shared by the engine and its consumers
//!
//! Everything here is plain data with a camelCase JSON shape:
//! - Metrics (cpu, memory, disk, network, processes)
//! - Alerts and log entries
//! - Threshold configuration and partial updates
//! - Optimization suggestions
//! - The snapshot handed to consumers after each tick

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

use crate::history::History;

/// Fixed process table, one name per slot (pid = 1000 + slot)
pub const PROCESS_NAMES: [&str; 8] = [
    "nginx", "mysql", "redis", "nodejs", "apache", "docker", "systemd", "ssh",
];

/// First pid of the simulated process table
pub const PROCESS_PID_BASE: u32 = 1000;

/// Complete simulated host metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub cpu: CpuMetrics,
    pub memory: MemoryMetrics,
    pub disk: DiskMetrics,
    pub network: NetworkMetrics,
    pub processes: Vec<ProcessEntry>,
}

/// CPU usage metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuMetrics {
    pub usage: f64,
    pub cores: u32,
    pub temperature: f64,
}

/// Memory usage metrics (MB)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryMetrics {
    pub used: f64,
    pub total: f64,
    pub available: f64,
}

/// Disk usage and instantaneous I/O rates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskMetrics {
    pub used: f64,
    pub total: f64,
    pub read: f64,
    pub write: f64,
}

/// Cumulative network counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkMetrics {
    pub bytes_in: f64,
    pub bytes_out: f64,
    pub connections: u32,
}

/// Individual process entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
    pub cpu: f64,
    pub memory: f64,
    pub status: ProcessStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessStatus {
    Running,
    Warning,
}

impl MemoryMetrics {
    pub fn percent_used(&self) -> f64 {
        if self.total > 0.0 {
            (self.used / self.total) * 100.0
        } else {
            0.0
        }
    }

    /// Restores `available = total - used` after `used` changed
    pub(crate) fn sync_available(&mut self) {
        self.available = self.total - self.used;
    }
}

impl DiskMetrics {
    pub fn percent_used(&self) -> f64 {
        if self.total > 0.0 {
            (self.used / self.total) * 100.0
        } else {
            0.0
        }
    }
}

impl Metrics {
    /// Plausible non-zero starting point so the first snapshot is not empty
    pub fn baseline(processes: Vec<ProcessEntry>) -> Self {
        Self {
            cpu: CpuMetrics { usage: 45.0, cores: 8, temperature: 52.0 },
            memory: MemoryMetrics { used: 8192.0, total: 16384.0, available: 8192.0 },
            disk: DiskMetrics { used: 250_000.0, total: 500_000.0, read: 25.0, write: 15.0 },
            network: NetworkMetrics { bytes_in: 1_500_000.0, bytes_out: 800_000.0, connections: 127 },
            processes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    /// Log level used when an alert of this severity is echoed to the log feed
    pub fn log_level(self) -> LogLevel {
        match self {
            Severity::Info => LogLevel::Info,
            Severity::Warning => LogLevel::Warning,
            Severity::Error => LogLevel::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: u64,
    pub title: String,
    pub message: String,
    pub severity: Severity,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub acknowledged: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
    Debug,
}

impl LogLevel {
    pub const ALL: [LogLevel; 4] = [LogLevel::Info, LogLevel::Warning, LogLevel::Error, LogLevel::Debug];

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Debug => "DEBUG",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    /// Case-insensitive: "warning", "Warning" and "WARNING" all match
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INFO" => Ok(LogLevel::Info),
            "WARNING" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            "DEBUG" => Ok(LogLevel::Debug),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub level: LogLevel,
    pub message: String,
}

/// Alert ceilings (percent for cpu/memory/disk, °C for temperature)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
    pub temperature: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            cpu: 80.0,
            memory: 85.0,
            disk: 90.0,
            temperature: 75.0,
        }
    }
}

/// Partial threshold update: absent fields are left untouched
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdsUpdate {
    pub cpu: Option<f64>,
    pub memory: Option<f64>,
    pub disk: Option<f64>,
    pub temperature: Option<f64>,
}

impl Thresholds {
    pub fn apply(&mut self, update: &ThresholdsUpdate) {
        if let Some(cpu) = update.cpu {
            self.cpu = cpu;
        }
        if let Some(memory) = update.memory {
            self.memory = memory;
        }
        if let Some(disk) = update.disk {
            self.disk = disk;
        }
        if let Some(temperature) = update.temperature {
            self.temperature = temperature;
        }
    }
}

/// Monitored resource a breach or a corrective action refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Cpu,
    Memory,
    Disk,
    Temperature,
}

impl Resource {
    pub fn as_str(self) -> &'static str {
        match self {
            Resource::Cpu => "cpu",
            Resource::Memory => "memory",
            Resource::Disk => "disk",
            Resource::Temperature => "temperature",
        }
    }

    /// Only cpu and memory breaches get a deferred corrective effect
    pub fn has_corrective_action(self) -> bool {
        matches!(self, Resource::Cpu | Resource::Memory)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Cpu,
    Memory,
    Cooling,
    Performance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    pub priority: Priority,
    pub title: String,
    pub description: String,
    pub actions: Vec<String>,
}

/// Point-in-time payload handed to consumers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub metrics: Metrics,
    pub history: History,
    pub alerts: Vec<Alert>,
    pub logs: Vec<LogEntry>,
}
