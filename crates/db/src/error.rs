//! Error type for transactional repository operations.

use cmms_core::error::CoreError;

/// Failure of a multi-statement write.
///
/// Business refusals discovered after rows are locked (unknown part,
/// insufficient stock) surface as [`TxError::Core`]; the open transaction
/// is rolled back when it is dropped.
#[derive(Debug, thiserror::Error)]
pub enum TxError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}
