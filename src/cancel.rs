//! Cooperative scan cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cloneable flag that stops a running scan.
///
/// Once [`cancel`](CancelToken::cancel) is called, the scanner stops spawning
/// branches and emitting addresses; the scan call returns
/// [`IpScanError::Cancelled`](crate::IpScanError::Cancelled) after in-flight
/// branches drain. A token stays cancelled, so a new scan needs a new token.
///
/// # Example
///
/// ```
/// use ipscan::{CancelToken, IpScanError, Scanner};
///
/// let token = CancelToken::new();
/// let mut scanner = Scanner::new();
/// scanner.set_cancel_token(token.clone());
///
/// let stop = token.clone();
/// scanner.on_address_generated(move |_, _| stop.cancel());
///
/// let result = scanner.scan("10.X.X.X");
/// assert!(matches!(result, Err(IpScanError::Cancelled)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation of every scan holding this token.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Returns `true` once [`cancel`](CancelToken::cancel) has been called.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}
