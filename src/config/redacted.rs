//! Secure string handling with redacted debug output.
//!
//! Holds the encryption passphrase while preventing accidental exposure in
//! logs or debug output, and zeroes the memory on drop.

use bon::Builder;
use derive_more::From;
use getset::Getters;
use std::fmt::{Debug, Formatter};
use zeroize::Zeroize;

/// Placeholder text shown instead of the actual passphrase in logs/debug output
pub static REDACTED_PASSPHRASE: &str = "###REDACTED_PASSPHRASE###";

/// A string that gets redacted in debug output.
#[derive(Clone, Zeroize, From, Builder, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct RedactedString {
    #[builder(into)]
    inner: String,
}

impl Debug for RedactedString {
    /// Always shows redacted placeholder instead of actual value
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", REDACTED_PASSPHRASE)
    }
}

impl Drop for RedactedString {
    fn drop(&mut self) {
        // Zero out the internal string when dropped
        self.zeroize();
    }
}
