//! Inclusion filters.

use std::collections::HashSet;

use crate::mask::blacklist_key;

/// Decides whether a candidate is expanded further.
///
/// The scanner calls [`should_process`](InclusionFilter::should_process) once
/// per substituted candidate at every expansion depth, so a filter can prune
/// a whole subtree as soon as its leading octets are fixed. A candidate is the
/// mask text up to and including the octet just substituted, e.g. `"10"`,
/// `"192.168"` or `"192.168.0.1"`.
///
/// Calls arrive concurrently from pool workers. Implementations must be pure
/// and must not rely on call order.
///
/// Any `Fn(&str) -> bool + Send + Sync` closure is a filter:
///
/// ```
/// use ipscan::Scanner;
///
/// // Skip every odd-numbered candidate.
/// let scanner = Scanner::with_filter(|candidate: &str| {
///     candidate
///         .rsplit('.')
///         .next()
///         .and_then(|octet| octet.parse::<u8>().ok())
///         .is_some_and(|octet| octet % 2 == 0)
/// });
/// # let _ = scanner;
/// ```
pub trait InclusionFilter: Send + Sync {
    /// Returns `true` if `candidate` should be emitted or expanded.
    fn should_process(&self, candidate: &str) -> bool;
}

impl<F> InclusionFilter for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn should_process(&self, candidate: &str) -> bool {
        self(candidate)
    }
}

/// Accepts every candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcceptAll;

impl InclusionFilter for AcceptAll {
    #[inline]
    fn should_process(&self, _candidate: &str) -> bool {
        true
    }
}

/// Excludes candidates whose literal prefix equals a blacklisted mask's.
///
/// Each blacklist mask is reduced to its literal prefix with
/// [`blacklist_key`](crate::blacklist_key), so `192.168.0.X` becomes
/// `192.168.0`. A candidate is rejected only when it equals a key exactly:
/// the subtree is pruned once expansion reaches the key's depth, and shorter
/// candidates such as `"192"` are never rejected by the deeper entry.
///
/// # Example
///
/// ```
/// use ipscan::{Blacklist, InclusionFilter};
///
/// let blacklist = Blacklist::new(["192.168.0.X"]);
/// assert!(!blacklist.should_process("192.168.0"));
/// assert!(blacklist.should_process("192.168"));
/// assert!(blacklist.should_process("192.168.1"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blacklist {
    keys: HashSet<String>,
}

impl Blacklist {
    /// Builds a blacklist from masks such as `10.X.X.X`.
    pub fn new<I, S>(masks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys = masks
            .into_iter()
            .map(|mask| blacklist_key(mask.as_ref()))
            .collect();
        Blacklist { keys }
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if nothing is blacklisted.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns `true` if `key` is one of the derived literal prefixes.
    pub fn contains_key(&self, key: &str) -> bool {
        self.keys.contains(key)
    }
}

impl InclusionFilter for Blacklist {
    fn should_process(&self, candidate: &str) -> bool {
        !self.keys.contains(candidate)
    }
}
