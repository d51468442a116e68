/// Errors surfaced by engine operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("Alert not found: {0}")]
    AlertNotFound(u64),
}
