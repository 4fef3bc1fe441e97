use classpulse_core::error::CoreError;
use classpulse_db::store::StoreError;

/// Failure of an engine operation invoked on behalf of a caller.
///
/// Per-recipient provider failures never surface here; they are recorded on
/// the delivery record instead.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
