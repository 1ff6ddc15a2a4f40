//! Worker pool sizing.

use std::num::NonZeroUsize;
use std::thread;

use log::debug;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};

use crate::error::IpScanError;

/// Minimum and maximum number of workers a scanner may run.
///
/// Zero means "no override" for either bound. The bounds are turned into a
/// pool size once, when the scanner's pool is first built:
///
/// - `maximum_worker_count > 0`: exactly that many workers.
/// - only `minimum_worker_count > 0`: at least that many, or one per
///   available core if that is more.
/// - neither: rayon's default.
///
/// A minimum above a non-zero maximum is rejected.
///
/// # Example
///
/// ```
/// use ipscan::WorkerBounds;
///
/// let bounds = WorkerBounds::default().minimum(4).maximum(16);
/// assert_eq!(bounds.minimum_worker_count, 4);
/// assert_eq!(bounds.maximum_worker_count, 16);
/// ```
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct WorkerBounds {
    /// Lower bound on concurrent workers (0 = no override).
    pub minimum_worker_count: usize,
    /// Upper bound on concurrent workers (0 = no override).
    pub maximum_worker_count: usize,
}

impl WorkerBounds {
    /// Sets the minimum worker count.
    #[must_use]
    pub fn minimum(mut self, count: usize) -> Self {
        self.minimum_worker_count = count;
        self
    }

    /// Sets the maximum worker count.
    #[must_use]
    pub fn maximum(mut self, count: usize) -> Self {
        self.maximum_worker_count = count;
        self
    }

    /// Resolves the bounds into a thread count.
    ///
    /// `Ok(None)` leaves the choice to rayon.
    pub fn thread_count(&self) -> Result<Option<usize>, IpScanError> {
        let (minimum, maximum) = (self.minimum_worker_count, self.maximum_worker_count);
        match (minimum, maximum) {
            (0, 0) => Ok(None),
            (min, max) if max > 0 && min > max => {
                Err(IpScanError::invalid_worker_bounds(min, max))
            }
            (_, max) if max > 0 => Ok(Some(max)),
            (min, _) => {
                let cores = thread::available_parallelism()
                    .map(NonZeroUsize::get)
                    .unwrap_or(1);
                Ok(Some(min.max(cores)))
            }
        }
    }

    /// Builds a dedicated pool sized from these bounds.
    pub(crate) fn build_pool(&self) -> Result<ThreadPool, IpScanError> {
        let threads = self.thread_count()?;
        let mut builder =
            ThreadPoolBuilder::new().thread_name(|index| format!("ipscan-worker-{index}"));
        if let Some(threads) = threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder.build()?;
        debug!(
            "built worker pool with {} threads (bounds {:?})",
            pool.current_num_threads(),
            self
        );
        Ok(pool)
    }
}
