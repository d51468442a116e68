//! Threshold evaluation.
//!
//! Compares the current metrics against the configured ceilings and reports
//! one breach per exceeded resource. The disk ceiling is configurable but not
//! evaluated.

use crate::models::{Metrics, Resource, Severity, Thresholds};

/// One exceeded ceiling
#[derive(Debug, Clone, PartialEq)]
pub struct Breach {
    pub resource: Resource,
    pub severity: Severity,
    pub title: &'static str,
    pub message: String,
    pub value: f64,
    pub threshold: f64,
}

/// Evaluate metrics against thresholds (strictly greater than the ceiling)
pub fn evaluate_breaches(metrics: &Metrics, thresholds: &Thresholds) -> Vec<Breach> {
    let mut breaches = Vec::new();

    if metrics.cpu.usage > thresholds.cpu {
        breaches.push(Breach {
            resource: Resource::Cpu,
            severity: Severity::Warning,
            title: "High CPU Usage",
            message: format!("CPU usage is {:.1}%", metrics.cpu.usage),
            value: metrics.cpu.usage,
            threshold: thresholds.cpu,
        });
    }

    let memory_percent = metrics.memory.percent_used();
    if memory_percent > thresholds.memory {
        breaches.push(Breach {
            resource: Resource::Memory,
            severity: Severity::Warning,
            title: "High Memory Usage",
            message: format!("Memory usage is {:.1}%", memory_percent),
            value: memory_percent,
            threshold: thresholds.memory,
        });
    }

    if metrics.cpu.temperature > thresholds.temperature {
        breaches.push(Breach {
            resource: Resource::Temperature,
            severity: Severity::Error,
            title: "High Temperature",
            message: format!("CPU temperature is {:.1}°C", metrics.cpu.temperature),
            value: metrics.cpu.temperature,
            threshold: thresholds.temperature,
        });
    }

    breaches
}

/// Cosmetic remediation actions logged after a breach
pub fn optimization_actions(resource: Resource) -> &'static [&'static str] {
    match resource {
        Resource::Cpu => &[
            "Clearing system caches",
            "Restarting high-CPU processes",
            "Adjusting CPU governor",
        ],
        Resource::Memory => &[
            "Clearing page cache",
            "Restarting memory-intensive services",
            "Running garbage collection",
        ],
        Resource::Disk => &[
            "Cleaning temporary files",
            "Compressing logs",
            "Defragmenting disk",
        ],
        Resource::Temperature => &[],
    }
}

pub const GENERIC_OPTIMIZATION: &str = "Generic optimization";
