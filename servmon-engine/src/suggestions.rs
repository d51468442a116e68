use crate::models::{Metrics, Priority, Suggestion, SuggestionKind};

// Informational levels, distinct from the alert thresholds
const CPU_ADVICE_LEVEL: f64 = 70.0;
const MEMORY_ADVICE_LEVEL: f64 = 75.0;
const TEMPERATURE_ADVICE_LEVEL: f64 = 65.0;

fn suggestion(
    kind: SuggestionKind,
    priority: Priority,
    title: &str,
    description: &str,
    actions: [&str; 3],
) -> Suggestion {
    Suggestion {
        kind,
        priority,
        title: title.to_string(),
        description: description.to_string(),
        actions: actions.iter().map(|a| a.to_string()).collect(),
    }
}

/// Ordered advice derived from the current metrics; never empty
pub fn optimization_suggestions(metrics: &Metrics) -> Vec<Suggestion> {
    let mut suggestions = Vec::new();

    if metrics.cpu.usage > CPU_ADVICE_LEVEL {
        suggestions.push(suggestion(
            SuggestionKind::Cpu,
            Priority::High,
            "Optimize CPU Usage",
            "CPU usage is elevated. Consider optimizing processes.",
            ["Enable CPU scaling", "Optimize process priorities", "Review running services"],
        ));
    }

    if metrics.memory.percent_used() > MEMORY_ADVICE_LEVEL {
        suggestions.push(suggestion(
            SuggestionKind::Memory,
            Priority::Medium,
            "Memory Optimization",
            "Memory usage is approaching limits",
            ["Clear system caches", "Restart memory-intensive services", "Consider adding more RAM"],
        ));
    }

    if metrics.cpu.temperature > TEMPERATURE_ADVICE_LEVEL {
        suggestions.push(suggestion(
            SuggestionKind::Cooling,
            Priority::High,
            "Temperature Management",
            "CPU temperature is elevated",
            ["Check cooling system", "Clean dust from fans", "Improve server room airflow"],
        ));
    }

    if suggestions.is_empty() {
        suggestions.push(suggestion(
            SuggestionKind::Performance,
            Priority::Low,
            "System Optimization",
            "Your system is running well. Consider these improvements.",
            ["Update system packages", "Optimize startup services", "Review security settings"],
        ));
    }

    suggestions
}
