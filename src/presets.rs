//! Ready-made private and public range scans.

use crate::error::IpScanError;
use crate::scanner::{BlacklistScan, DefaultScan, ScanArgs, Scanner, ScannerId};

/// Masks covering the RFC 1918 private ranges.
///
/// `192.168.X.X`, `10.X.X.X`, then `172.16.X.X` through `172.31.X.X`.
pub fn private_range_masks() -> Vec<String> {
    let mut masks = vec!["192.168.X.X".to_owned(), "10.X.X.X".to_owned()];
    masks.extend((16..=31).map(|second| format!("172.{second}.X.X")));
    masks
}

/// Masks excluded from a public scan: the private ranges plus loopback.
pub fn public_blacklist_masks() -> Vec<String> {
    let mut masks = private_range_masks();
    masks.push("127.X.X.X".to_owned());
    masks
}

/// Generates every private IPv4 address.
///
/// ```no_run
/// use ipscan::PrivateScan;
///
/// PrivateScan::new(|_, args| println!("{}", args))
///     .minimum_worker_count(100)
///     .maximum_worker_count(150)
///     .scan()?;
/// # Ok::<(), ipscan::IpScanError>(())
/// ```
#[derive(Debug)]
pub struct PrivateScan {
    scanner: DefaultScan,
    masks: Vec<String>,
}

impl PrivateScan {
    /// Creates a private range scan reporting to `handler`.
    pub fn new<H>(handler: H) -> Self
    where
        H: Fn(ScannerId, &ScanArgs) + Send + Sync + 'static,
    {
        let mut scanner = Scanner::new();
        scanner.on_address_generated(handler);
        PrivateScan {
            scanner,
            masks: private_range_masks(),
        }
    }

    /// Sets the minimum worker count of the underlying scanner.
    #[must_use]
    pub fn minimum_worker_count(mut self, count: usize) -> Self {
        self.scanner.set_minimum_worker_count(count);
        self
    }

    /// Sets the maximum worker count of the underlying scanner.
    #[must_use]
    pub fn maximum_worker_count(mut self, count: usize) -> Self {
        self.scanner.set_maximum_worker_count(count);
        self
    }

    /// The masks this scan expands.
    pub fn masks(&self) -> &[String] {
        &self.masks
    }

    pub fn scanner(&self) -> &DefaultScan {
        &self.scanner
    }

    /// Runs the scan, blocking until every private address was emitted.
    pub fn scan(&self) -> Result<(), IpScanError> {
        self.scanner.scan_all(self.masks.iter().map(String::as_str))
    }
}

/// Generates every public IPv4 address.
///
/// Expands `X.X.X.X` through a [`Blacklist`](crate::Blacklist) of
/// [`public_blacklist_masks`].
#[derive(Debug)]
pub struct PublicScan {
    scanner: BlacklistScan,
}

impl PublicScan {
    /// The single mask a public scan expands.
    pub const MASK: &'static str = "X.X.X.X";

    /// Creates a public range scan reporting to `handler`.
    pub fn new<H>(handler: H) -> Self
    where
        H: Fn(ScannerId, &ScanArgs) + Send + Sync + 'static,
    {
        let mut scanner = Scanner::blacklist(public_blacklist_masks());
        scanner.on_address_generated(handler);
        PublicScan { scanner }
    }

    /// Sets the minimum worker count of the underlying scanner.
    #[must_use]
    pub fn minimum_worker_count(mut self, count: usize) -> Self {
        self.scanner.set_minimum_worker_count(count);
        self
    }

    /// Sets the maximum worker count of the underlying scanner.
    #[must_use]
    pub fn maximum_worker_count(mut self, count: usize) -> Self {
        self.scanner.set_maximum_worker_count(count);
        self
    }

    pub fn scanner(&self) -> &BlacklistScan {
        &self.scanner
    }

    /// Runs the scan, blocking until every public address was emitted.
    pub fn scan(&self) -> Result<(), IpScanError> {
        self.scanner.scan(Self::MASK)
    }
}
