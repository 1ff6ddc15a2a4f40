//! Mask expansion and address emission.

use std::fmt;
use std::net::{AddrParseError, Ipv4Addr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use log::{debug, trace, warn};
use rayon::{Scope, ThreadPool};

use crate::cancel::CancelToken;
use crate::error::IpScanError;
use crate::filter::{AcceptAll, Blacklist, InclusionFilter};
use crate::mask::Mask;
use crate::pool::WorkerBounds;

static NEXT_SCANNER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of the scanner that generated an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScannerId(u64);

impl ScannerId {
    fn next() -> Self {
        ScannerId(NEXT_SCANNER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ScannerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scanner-{}", self.0)
    }
}

/// A generated address, as passed to address handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanArgs {
    address: String,
}

impl ScanArgs {
    /// The generated address in dotted-quad form.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Parses the address.
    ///
    /// Fails only when the scanned mask held malformed literals.
    pub fn ip(&self) -> Result<Ipv4Addr, AddrParseError> {
        self.address.parse()
    }

    /// Consumes the arguments and returns the address.
    pub fn into_address(self) -> String {
        self.address
    }
}

impl fmt::Display for ScanArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

type AddressHandler = Box<dyn Fn(ScannerId, &ScanArgs) + Send + Sync>;

/// Scanner that accepts every candidate.
pub type DefaultScan = Scanner<AcceptAll>;

/// Scanner that skips blacklisted masks.
pub type BlacklistScan = Scanner<Blacklist>;

/// Expands wildcard masks into IPv4 addresses.
///
/// Every wildcard field is replaced by each value `0..=255` in turn. Each
/// substituted candidate is offered to the scanner's [`InclusionFilter`];
/// accepted candidates are either emitted to the registered handlers (when no
/// wildcard remains) or expanded further as a new branch on the scanner's
/// worker pool.
///
/// Handlers run on pool workers, concurrently and in no particular order.
/// The scan call blocks until every branch it spawned has finished.
///
/// # Example
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// use ipscan::Scanner;
///
/// let count = Arc::new(AtomicUsize::new(0));
/// let seen = Arc::clone(&count);
///
/// let mut scanner = Scanner::new();
/// scanner.on_address_generated(move |_, args| {
///     assert!(args.address().starts_with("192.168.1."));
///     seen.fetch_add(1, Ordering::Relaxed);
/// });
///
/// scanner.scan("192.168.1.X")?;
/// assert_eq!(count.load(Ordering::Relaxed), 256);
/// # Ok::<(), ipscan::IpScanError>(())
/// ```
pub struct Scanner<F: InclusionFilter = AcceptAll> {
    id: ScannerId,
    filter: F,
    handlers: Vec<AddressHandler>,
    bounds: WorkerBounds,
    pool: OnceLock<ThreadPool>,
    cancel: Option<CancelToken>,
}

impl Scanner<AcceptAll> {
    /// Creates a scanner that emits every address of the scanned masks.
    pub fn new() -> Self {
        Scanner::with_filter(AcceptAll)
    }
}

impl Default for Scanner<AcceptAll> {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner<Blacklist> {
    /// Creates a scanner that skips the given masks.
    ///
    /// ```
    /// let scanner = ipscan::Scanner::blacklist(["192.168.0.X"]);
    /// assert!(scanner.filter().contains_key("192.168.0"));
    /// ```
    pub fn blacklist<I, S>(masks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Scanner::with_filter(Blacklist::new(masks))
    }
}

impl<F: InclusionFilter> Scanner<F> {
    /// Creates a scanner around a custom filter.
    pub fn with_filter(filter: F) -> Self {
        Scanner {
            id: ScannerId::next(),
            filter,
            handlers: Vec::new(),
            bounds: WorkerBounds::default(),
            pool: OnceLock::new(),
            cancel: None,
        }
    }

    /// This scanner's identity, as passed to its handlers.
    pub fn id(&self) -> ScannerId {
        self.id
    }

    /// The filter fixed at construction.
    pub fn filter(&self) -> &F {
        &self.filter
    }

    /// Registers a handler for generated addresses.
    ///
    /// Handlers accumulate; each generated address is passed to all of them
    /// in registration order. They are called from pool workers and must
    /// tolerate concurrent invocation.
    pub fn on_address_generated<H>(&mut self, handler: H)
    where
        H: Fn(ScannerId, &ScanArgs) + Send + Sync + 'static,
    {
        self.handlers.push(Box::new(handler));
    }

    /// Number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn minimum_worker_count(&self) -> usize {
        self.bounds.minimum_worker_count
    }

    pub fn maximum_worker_count(&self) -> usize {
        self.bounds.maximum_worker_count
    }

    /// Sets the minimum worker count. Only effective before the first scan.
    pub fn set_minimum_worker_count(&mut self, count: usize) {
        self.set_worker_bounds(self.bounds.minimum(count));
    }

    /// Sets the maximum worker count. Only effective before the first scan.
    pub fn set_maximum_worker_count(&mut self, count: usize) {
        self.set_worker_bounds(self.bounds.maximum(count));
    }

    pub fn worker_bounds(&self) -> WorkerBounds {
        self.bounds
    }

    /// Replaces both worker bounds. Only effective before the first scan.
    ///
    /// The bounds are applied once, when the first scan builds this scanner's
    /// pool. Later changes are recorded but do not resize the pool.
    pub fn set_worker_bounds(&mut self, bounds: WorkerBounds) {
        if self.pool.get().is_some() && bounds != self.bounds {
            warn!(
                "{}: worker bounds changed to {:?} after the pool was built; ignoring",
                self.id, bounds
            );
        }
        self.bounds = bounds;
    }

    /// Attaches a token that can stop this scanner's scans.
    pub fn set_cancel_token(&mut self, token: CancelToken) {
        self.cancel = Some(token);
    }

    pub fn cancel_token(&self) -> Option<&CancelToken> {
        self.cancel.as_ref()
    }

    /// Generates every address matching `mask`.
    ///
    /// Blocks until all addresses have been passed to the handlers.
    ///
    /// # Errors
    ///
    /// - [`IpScanError::NoHandler`] if no handler is registered.
    /// - [`IpScanError::InvalidWorkerBounds`] or [`IpScanError::WorkerPool`]
    ///   if this is the first scan and the pool cannot be built.
    /// - [`IpScanError::Cancelled`] if the cancel token fired.
    ///
    /// No handler is called when the first two fail.
    pub fn scan(&self, mask: impl Into<Mask>) -> Result<(), IpScanError> {
        let pool = self.prepare()?;
        let mask = mask.into();
        debug!("{}: scanning {}", self.id, mask);

        pool.scope(|scope| self.expand(scope, mask));

        self.finish()
    }

    /// Generates every address matching any of `masks`.
    ///
    /// Each mask is expanded as its own unit of work, concurrently with the
    /// others. Overlapping masks produce duplicate addresses. Blocks until
    /// every mask is exhausted; errors as for [`scan`](Scanner::scan).
    pub fn scan_all<I, M>(&self, masks: I) -> Result<(), IpScanError>
    where
        I: IntoIterator<Item = M>,
        M: Into<Mask>,
    {
        let pool = self.prepare()?;
        let masks: Vec<Mask> = masks.into_iter().map(Into::into).collect();
        debug!("{}: scanning {} masks", self.id, masks.len());

        pool.scope(|scope| {
            for mask in masks {
                if self.is_cancelled() {
                    break;
                }
                scope.spawn(move |scope| self.expand(scope, mask));
            }
        });

        self.finish()
    }

    fn prepare(&self) -> Result<&ThreadPool, IpScanError> {
        if self.handlers.is_empty() {
            return Err(IpScanError::NoHandler);
        }
        self.pool()
    }

    fn pool(&self) -> Result<&ThreadPool, IpScanError> {
        if let Some(pool) = self.pool.get() {
            return Ok(pool);
        }
        let pool = self.bounds.build_pool()?;
        // A concurrent first scan may have won the race; its pool is kept.
        Ok(self.pool.get_or_init(|| pool))
    }

    fn finish(&self) -> Result<(), IpScanError> {
        if self.is_cancelled() {
            debug!("{}: scan cancelled", self.id);
            return Err(IpScanError::Cancelled);
        }
        debug!("{}: scan complete", self.id);
        Ok(())
    }

    fn expand<'scope>(&'scope self, scope: &Scope<'scope>, mask: Mask) {
        let split = match mask.split() {
            Some(split) => split,
            None => {
                // Nothing left to substitute: the mask is itself an address.
                if !self.is_cancelled() && self.filter.should_process(mask.as_str()) {
                    self.emit(mask.as_str().to_owned());
                }
                return;
            }
        };

        for octet in 0..=u8::MAX {
            if self.is_cancelled() {
                return;
            }

            let candidate = split.candidate(octet);
            if !self.filter.should_process(&candidate) {
                trace!("{}: pruned {}", self.id, candidate);
                continue;
            }

            if split.is_last() {
                self.emit(candidate);
            } else {
                let next = split.branch(&candidate);
                scope.spawn(move |scope| self.expand(scope, next));
            }
        }
    }

    fn emit(&self, address: String) {
        let args = ScanArgs { address };
        for handler in &self.handlers {
            handler(self.id, &args);
        }
    }

    #[inline]
    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }
}

impl<F: InclusionFilter + fmt::Debug> fmt::Debug for Scanner<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scanner")
            .field("id", &self.id)
            .field("filter", &self.filter)
            .field("handlers", &self.handlers.len())
            .field("bounds", &self.bounds)
            .field("pool_built", &self.pool.get().is_some())
            .field("cancel", &self.cancel)
            .finish()
    }
}
