//! Caller-supplied hooks for local-part handling and whole-address policy.
//!
//! Every hook is a trait with a blanket impl for matching closures, so both
//! named strategies and ad-hoc lambdas can be stored in a [`Config`](super::Config).

use std::sync::LazyLock;

use regex::Regex;

/// Mailbox, tag and comment extracted from a local part.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalParts {
    pub mailbox: String,
    pub tag: Option<String>,
    pub comment: Option<String>,
}

/// Replaces the built-in local-part parser entirely.
pub trait LocalParser: Send + Sync {
    fn parse(&self, raw: &str) -> LocalParts;
}

impl<F> LocalParser for F
where
    F: Fn(&str) -> LocalParts + Send + Sync,
{
    fn parse(&self, raw: &str) -> LocalParts {
        self(raw)
    }
}

/// Maps a mailbox to its account-identity form.
pub trait MailboxCanonicalizer: Send + Sync {
    fn canonicalize(&self, mailbox: &str) -> String;
}

impl<F> MailboxCanonicalizer for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn canonicalize(&self, mailbox: &str) -> String {
        self(mailbox)
    }
}

/// Replaces the grammar check of the configured local format.
pub trait MailboxValidator: Send + Sync {
    fn is_valid(&self, mailbox: &str, tag: Option<&str>) -> bool;
}

impl<F> MailboxValidator for F
where
    F: Fn(&str, Option<&str>) -> bool + Send + Sync,
{
    fn is_valid(&self, mailbox: &str, tag: Option<&str>) -> bool {
        self(mailbox, tag)
    }
}

/// Final whole-address predicate; a `false` yields `not_allowed`.
pub trait AddressValidator: Send + Sync {
    fn allows(&self, address: &str) -> bool;
}

impl<F> AddressValidator for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn allows(&self, address: &str) -> bool {
        self(address)
    }
}

/// Drops every `.` from the lower-cased mailbox (Gmail semantics).
#[derive(Debug, Clone, Copy, Default)]
pub struct StripDots;

impl MailboxCanonicalizer for StripDots {
    fn canonicalize(&self, mailbox: &str) -> String {
        mailbox.to_lowercase().replace('.', "")
    }
}

static MSN_MAILBOX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[0-9a-z_][\-0-9a-z_]*(?:\.[\-0-9a-z_]+)*$").expect("static regex")
});

/// Outlook/Hotmail mailbox rule: an ASCII word character first, then word
/// characters or hyphens, dot-separated.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsnMailbox;

impl MailboxValidator for MsnMailbox {
    fn is_valid(&self, mailbox: &str, _tag: Option<&str>) -> bool {
        MSN_MAILBOX.is_match(mailbox)
    }
}
