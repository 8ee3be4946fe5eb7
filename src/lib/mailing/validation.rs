use std::fmt;

use super::models::{EmailPattern, Recipient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    NoNames,
    BadEmail,
}

/// A recipient that failed the check, with its 1-based position in the list.
#[derive(Debug, PartialEq, Eq)]
pub struct InvalidEntry<'a> {
    pub index: usize,
    pub reason: InvalidReason,
    pub recipient: &'a Recipient,
}

impl fmt::Display for InvalidEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.reason {
            InvalidReason::NoNames => "No names object",
            InvalidReason::BadEmail => "Email is invalid",
        };
        write!(
            f,
            "Entry at index: {} is invalid: {} {}",
            self.index, what, self.recipient
        )
    }
}

/// Collects every problem in the list. All entries without names come first,
/// then all entries with a malformed address, each group in list order.
pub fn find_invalid_entries(
    recipients: &[Recipient],
    pattern: EmailPattern,
) -> Vec<InvalidEntry<'_>> {
    let nameless = recipients
        .iter()
        .enumerate()
        .filter(|(_, r)| r.has_no_names())
        .map(|(idx, r)| InvalidEntry {
            index: idx + 1,
            reason: InvalidReason::NoNames,
            recipient: r,
        });
    let bad_emails = recipients
        .iter()
        .enumerate()
        .filter(|(_, r)| !pattern.is_match(&r.email))
        .map(|(idx, r)| InvalidEntry {
            index: idx + 1,
            reason: InvalidReason::BadEmail,
            recipient: r,
        });
    nameless.chain(bad_emails).collect()
}
