use parking_lot::Mutex;
use servmon_engine::SimulationEngine;
use std::sync::Arc;

pub type Shared<T> = Arc<Mutex<T>>;

/// Moteur partagé entre driver, corrections et handlers HTTP.
/// Ne jamais garder le verrou à travers un `.await`.
pub type SharedEngine = Shared<SimulationEngine>;

pub fn new_state<T>(value: T) -> Shared<T> {
    Arc::new(Mutex::new(value))
}
