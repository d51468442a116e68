use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::state::SharedEngine;
use crate::ws::BroadcastHub;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KernelHealth {
    pub uptime_seconds: u64,
    pub ticks: u64,
    pub alerts: usize,
    pub unacknowledged_alerts: usize,
    pub logs: usize,
    pub connected_clients: usize,
    pub memory_usage_mb: f32,
}

#[derive(Clone)]
pub struct HealthTracker {
    start_time: Instant,
}

impl HealthTracker {
    pub fn new() -> Self {
        Self { start_time: Instant::now() }
    }

    pub fn get_health(&self, engine: &SharedEngine, hub: &BroadcastHub) -> KernelHealth {
        let stats = engine.lock().stats();

        KernelHealth {
            uptime_seconds: self.start_time.elapsed().as_secs(),
            ticks: stats.ticks,
            alerts: stats.alerts,
            unacknowledged_alerts: stats.unacknowledged_alerts,
            logs: stats.logs,
            connected_clients: hub.client_count(),
            memory_usage_mb: get_memory_usage_mb(),
        }
    }
}

impl Default for HealthTracker {
    fn default() -> Self {
        Self::new()
    }
}

fn get_memory_usage_mb() -> f32 {
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
            for line in status.lines() {
                if let Some(rest) = line.strip_prefix("VmRSS:") {
                    if let Some(Ok(kb)) = rest.split_whitespace().next().map(str::parse::<u64>) {
                        return (kb as f32) / 1024.0; // KB -> MB
                    }
                }
            }
        }
    }

    // Fallback approximatif
    12.0
}
