#![deny(trivial_casts, trivial_numeric_casts, unused_import_braces)]
//! # IPv4 Mask Scanner
//!
//! This library generates IPv4 addresses from wildcard masks such as
//! `192.168.X.X`, expanding every wildcard field over `0..=255`.
//!
//! ## How it works
//!
//! A scan replaces the first wildcard of a mask with each octet value in
//! turn. Every substituted candidate is checked by an [`InclusionFilter`];
//! rejected candidates are dropped together with everything below them.
//! Accepted candidates with wildcards left are expanded as new branches on
//! the scanner's worker pool, and complete addresses are passed to the
//! registered handlers.
//!
//! - [`Scanner::new`] accepts everything ([`AcceptAll`]).
//! - [`Scanner::blacklist`] skips masks through a [`Blacklist`].
//! - [`Scanner::with_filter`] takes any [`InclusionFilter`], including plain
//!   closures.
//! - [`PrivateScan`] and [`PublicScan`] cover the private and public ranges.
//!
//! ## Thread Safety
//!
//! Each scanner owns a rayon thread pool, sized from its [`WorkerBounds`] when
//! the first scan starts. Handlers and filters are called from pool workers
//! concurrently and in no particular order, so they must be `Send + Sync`.
//! A scan call blocks until every address has been delivered.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! use ipscan::Scanner;
//!
//! fn main() -> Result<(), ipscan::IpScanError> {
//!     let count = Arc::new(AtomicUsize::new(0));
//!     let seen = Arc::clone(&count);
//!
//!     let mut scanner = Scanner::blacklist(["192.168.0.X"]);
//!     scanner.set_maximum_worker_count(4);
//!     scanner.on_address_generated(move |_, args| {
//!         assert!(!args.address().starts_with("192.168.0."));
//!         seen.fetch_add(1, Ordering::Relaxed);
//!     });
//!
//!     scanner.scan("192.168.X.X")?;
//!
//!     assert_eq!(count.load(Ordering::Relaxed), 256 * 256 - 256);
//!     Ok(())
//! }
//! ```

mod cancel;
mod error;
mod filter;
mod mask;
mod pool;
mod presets;
mod scanner;

// Re-export public types
pub use cancel::CancelToken;
pub use error::IpScanError;
pub use filter::{AcceptAll, Blacklist, InclusionFilter};
pub use mask::{blacklist_key, Mask, MaskSplit, WILDCARD};
pub use pool::WorkerBounds;
pub use presets::{private_range_masks, public_blacklist_masks, PrivateScan, PublicScan};
pub use scanner::{BlacklistScan, DefaultScan, ScanArgs, Scanner, ScannerId};

#[cfg(test)]
mod scanner_test;
