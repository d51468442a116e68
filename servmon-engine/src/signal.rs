//! Per-tick evolution of the simulated metrics
//!
//! CPU and memory follow slow sine waves of the wall clock (60s and 120s
//! periods in milliseconds units) plus uniform jitter. Disk and network
//! counters only ever grow.

use rand::Rng;

use crate::models::{Metrics, ProcessEntry, ProcessStatus, PROCESS_NAMES, PROCESS_PID_BASE};

const CPU_MIN: f64 = 5.0;
const CPU_MAX: f64 = 95.0;
const MEMORY_MIN: f64 = 2000.0;
const MEMORY_MAX: f64 = 15000.0;
const PROCESS_WARNING_PROBABILITY: f64 = 0.05;

/// Symmetric jitter in [-span/2, span/2)
fn jitter<R: Rng + ?Sized>(rng: &mut R, span: f64) -> f64 {
    (rng.gen::<f64>() - 0.5) * span
}

/// Advances every metric by one tick at wall-clock time `now_ms`
pub(crate) fn evolve<R: Rng + ?Sized>(metrics: &mut Metrics, now_ms: i64, rng: &mut R) {
    let t = now_ms as f64;

    let base_load = 25.0 + (t / 60_000.0).sin() * 15.0;
    metrics.cpu.usage = (base_load + jitter(rng, 20.0)).clamp(CPU_MIN, CPU_MAX);
    // temperature is derived, never clamped
    metrics.cpu.temperature = 45.0 + (metrics.cpu.usage / 100.0) * 30.0 + jitter(rng, 5.0);

    let memory_trend = 50.0 + (t / 120_000.0).sin() * 20.0;
    metrics.memory.used = (memory_trend * 100.0 + jitter(rng, 1000.0)).clamp(MEMORY_MIN, MEMORY_MAX);
    metrics.memory.sync_available();

    // disk.used is unbounded: it is never clamped against disk.total
    metrics.disk.used += rng.gen::<f64>() * 5.0;
    metrics.disk.read = rng.gen::<f64>() * 100.0;
    metrics.disk.write = rng.gen::<f64>() * 50.0;

    metrics.network.bytes_in += rng.gen::<f64>() * 1_000_000.0;
    metrics.network.bytes_out += rng.gen::<f64>() * 500_000.0;
    metrics.network.connections = (80.0 + rng.gen::<f64>() * 100.0).floor() as u32;

    metrics.processes = roll_processes(rng);
}

/// Fresh cpu/memory/status for every slot of the fixed process table
pub(crate) fn roll_processes<R: Rng + ?Sized>(rng: &mut R) -> Vec<ProcessEntry> {
    PROCESS_NAMES
        .iter()
        .enumerate()
        .map(|(slot, name)| ProcessEntry {
            pid: PROCESS_PID_BASE + slot as u32,
            name: (*name).to_string(),
            cpu: rng.gen_range(0.0..15.0),
            memory: rng.gen_range(0.0..500.0),
            status: if rng.gen_bool(PROCESS_WARNING_PROBABILITY) {
                ProcessStatus::Warning
            } else {
                ProcessStatus::Running
            },
        })
        .collect()
}
