use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::models::Metrics;

pub const DEFAULT_HISTORY_SIZE: usize = 50;

/// Percent sample for the cpu/memory/disk charts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentSample {
    pub time: i64, // Unix epoch milliseconds
    pub value: f64,
}

/// Cumulative byte counters at a point in time (not rates)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkSample {
    pub time: i64,
    #[serde(rename = "in")]
    pub bytes_in: f64,
    #[serde(rename = "out")]
    pub bytes_out: f64,
}

/// Bounded FIFO buffers feeding the dashboard charts, oldest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct History {
    #[serde(skip, default = "default_capacity")]
    capacity: usize,
    pub cpu: VecDeque<PercentSample>,
    pub memory: VecDeque<PercentSample>,
    pub disk: VecDeque<PercentSample>,
    pub network: VecDeque<NetworkSample>,
}

fn default_capacity() -> usize {
    DEFAULT_HISTORY_SIZE
}

impl History {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            cpu: VecDeque::with_capacity(capacity),
            memory: VecDeque::with_capacity(capacity),
            disk: VecDeque::with_capacity(capacity),
            network: VecDeque::with_capacity(capacity),
        }
    }

    /// Appends one sample per buffer taken from `metrics`
    pub fn record(&mut self, time: i64, metrics: &Metrics) {
        let capacity = self.capacity;
        Self::push_value(
            &mut self.cpu,
            PercentSample { time, value: metrics.cpu.usage },
            capacity,
        );
        Self::push_value(
            &mut self.memory,
            PercentSample { time, value: metrics.memory.percent_used() },
            capacity,
        );
        Self::push_value(
            &mut self.disk,
            PercentSample { time, value: metrics.disk.percent_used() },
            capacity,
        );
        Self::push_value(
            &mut self.network,
            NetworkSample {
                time,
                bytes_in: metrics.network.bytes_in,
                bytes_out: metrics.network.bytes_out,
            },
            capacity,
        );
    }

    fn push_value<T>(queue: &mut VecDeque<T>, value: T, capacity: usize) {
        if capacity == 0 {
            return;
        }
        while queue.len() >= capacity {
            queue.pop_front();
        }
        queue.push_back(value);
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics_with_cpu(usage: f64) -> Metrics {
        let mut metrics = Metrics::baseline(Vec::new());
        metrics.cpu.usage = usage;
        metrics
    }

    #[test]
    fn test_history_keeps_most_recent_in_order() {
        let mut history = History::with_capacity(50);
        for i in 0..80 {
            history.record(i, &metrics_with_cpu(i as f64));
        }

        assert_eq!(history.cpu.len(), 50);
        assert_eq!(history.network.len(), 50);
        let times: Vec<i64> = history.cpu.iter().map(|s| s.time).collect();
        let expected: Vec<i64> = (30..80).collect();
        assert_eq!(times, expected);
    }

    #[test]
    fn test_history_derives_percentages() {
        let mut history = History::new();
        history.record(1, &Metrics::baseline(Vec::new()));

        assert_eq!(history.memory[0].value, 50.0);
        assert_eq!(history.disk[0].value, 50.0);
        assert_eq!(history.network[0].bytes_in, 1_500_000.0);
    }

    #[test]
    fn test_network_sample_wire_names() {
        let sample = NetworkSample { time: 7, bytes_in: 1.0, bytes_out: 2.0 };
        let json = serde_json::to_value(sample).unwrap();
        assert_eq!(json["in"], 1.0);
        assert_eq!(json["out"], 2.0);
        assert_eq!(json["time"], 7);
    }
}
