//! Wildcard mask parsing.

use std::convert::Infallible;
use std::fmt::{self, Write};
use std::str::FromStr;

use memchr::{memchr, memchr_iter};

/// The wildcard marker, after lower-casing.
pub const WILDCARD: char = 'x';

const WILDCARD_BYTE: u8 = WILDCARD as u8;

/// A dotted IPv4 address template such as `192.168.X.X`.
///
/// Each of the four dot-separated fields is either a literal octet or the
/// wildcard marker `X` (case-insensitive). Wildcards need not be contiguous:
/// `192.X.168.X` is a valid mask and expands left to right.
///
/// Octet literals are not range-checked. A malformed mask expands into
/// malformed addresses rather than failing.
///
/// # Example
///
/// ```
/// use ipscan::Mask;
///
/// let mask: Mask = "192.168.X.X".parse().unwrap();
/// assert_eq!(mask.as_str(), "192.168.x.x");
/// assert_eq!(mask.wildcard_count(), 2);
///
/// let split = mask.split().unwrap();
/// assert_eq!(split.prefix(), "192.168.x");
/// assert_eq!(split.suffix(), ".x");
/// assert_eq!(split.candidate(7), "192.168.7");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Mask(String);

impl Mask {
    /// Creates a mask, canonicalizing it to lower case.
    pub fn new(mask: impl AsRef<str>) -> Self {
        Mask(mask.as_ref().to_lowercase())
    }

    /// Returns the canonical (lower-cased) mask text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of wildcard fields still to expand.
    pub fn wildcard_count(&self) -> usize {
        memchr_iter(WILDCARD_BYTE, self.0.as_bytes()).count()
    }

    /// Returns `true` when no wildcard remains, i.e. the mask is an address.
    pub fn is_terminal(&self) -> bool {
        memchr(WILDCARD_BYTE, self.0.as_bytes()).is_none()
    }

    /// Splits the mask around its first wildcard.
    ///
    /// Returns `None` for a terminal mask.
    pub fn split(&self) -> Option<MaskSplit<'_>> {
        let index = memchr(WILDCARD_BYTE, self.0.as_bytes())?;
        // `x` is ASCII, so `index + 1` is always a char boundary.
        let (prefix, suffix) = self.0.split_at(index + 1);
        Some(MaskSplit { prefix, suffix })
    }

    /// Consumes the mask and returns its text.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Mask {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Mask::new(s))
    }
}

impl From<&str> for Mask {
    fn from(s: &str) -> Self {
        Mask::new(s)
    }
}

impl From<String> for Mask {
    fn from(s: String) -> Self {
        Mask::new(s)
    }
}

impl AsRef<str> for Mask {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A mask split around its first wildcard.
///
/// `prefix` runs up to and including the wildcard; `suffix` is the unmodified
/// remainder and may hold further wildcards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskSplit<'a> {
    prefix: &'a str,
    suffix: &'a str,
}

impl<'a> MaskSplit<'a> {
    /// Text up to and including the wildcard being expanded.
    pub fn prefix(&self) -> &'a str {
        self.prefix
    }

    /// Remainder of the mask after the wildcard being expanded.
    pub fn suffix(&self) -> &'a str {
        self.suffix
    }

    /// Returns `true` when nothing follows the wildcard being expanded.
    pub fn is_last(&self) -> bool {
        self.suffix.is_empty()
    }

    /// The prefix with its wildcard replaced by `octet`.
    ///
    /// This is the string handed to the inclusion filter, e.g. `"10"` for the
    /// first field of `X.X.X.X` or `"192.168"` for the second field of
    /// `192.X.X.X`.
    pub fn candidate(&self, octet: u8) -> String {
        let literal = &self.prefix[..self.prefix.len() - 1];
        let mut candidate = String::with_capacity(self.prefix.len() + 2);
        candidate.push_str(literal);
        // Writing into a String cannot fail.
        let _ = write!(candidate, "{octet}");
        candidate
    }

    /// Joins an accepted candidate with the remaining suffix.
    pub fn branch(&self, candidate: &str) -> Mask {
        let mut next = String::with_capacity(candidate.len() + self.suffix.len());
        next.push_str(candidate);
        next.push_str(self.suffix);
        // Both halves are already lower case.
        Mask(next)
    }
}

/// Derives the comparison key used by blacklist filtering.
///
/// The mask is lower-cased and every `.x` is removed, leaving the literal
/// prefix: `192.168.0.X` becomes `192.168.0`, `10.X.X.X` becomes `10`.
pub fn blacklist_key(mask: &str) -> String {
    mask.to_lowercase().replace(".x", "")
}
