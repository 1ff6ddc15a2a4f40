//! Error types for scan operations.

use rayon::ThreadPoolBuildError;
use thiserror::Error;

/// Error returned by scan operations.
///
/// Every variant is raised before the scan emits its first address, except
/// [`IpScanError::Cancelled`], which is reported once in-flight branches have
/// drained.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum IpScanError {
    /// `scan` was called before any address handler was registered.
    #[error("no address handler registered")]
    NoHandler,

    /// The requested worker bounds cannot be satisfied together.
    #[error("invalid worker bounds: minimum {minimum} exceeds maximum {maximum}")]
    InvalidWorkerBounds {
        /// Requested minimum worker count.
        minimum: usize,
        /// Requested maximum worker count.
        maximum: usize,
    },

    /// The worker pool could not be built.
    #[error("worker pool error: {0}")]
    WorkerPool(
        #[from]
        #[source]
        ThreadPoolBuildError,
    ),

    /// The scan's cancel token was triggered before expansion finished.
    #[error("scan cancelled")]
    Cancelled,
}

impl IpScanError {
    /// Creates an InvalidWorkerBounds error.
    pub fn invalid_worker_bounds(minimum: usize, maximum: usize) -> Self {
        IpScanError::InvalidWorkerBounds { minimum, maximum }
    }
}
