#![forbid(unsafe_code)]
//! E-mail address parsing, validation, canonicalisation and
//! envelope rewriting (SRS, VERP, BATV).
//!
//! Every parse takes an immutable [`Config`]. [`Config::offline`] keeps
//! everything local; the default configuration validates hosts through DNS
//! MX lookups.

pub mod address;
pub mod config;
pub mod dmarc;
pub mod dns;
pub mod error;
pub mod exchanger;
pub mod host;
pub mod local;
pub mod matcher;
pub mod rewriter;
pub mod smtp;

pub use address::{Address, AddressForm, DigestKind};
pub use config::{
    Config, DnsLookup, HostEncoding, HostValidation, LocalEncoding, LocalFormat, ProviderRegistry,
    ProviderRule,
};
pub use dmarc::{DmarcPolicy, DmarcRecord};
pub use dns::{DnsError, DnsResolver, MxRecord, StaticResolver, SystemResolver};
pub use error::{ErrorKind, ValidationError};
pub use exchanger::{Exchanger, ExchangerCache, MxHost, MxLookup};
pub use host::{Host, HostParts};
pub use local::{Local, LocalForm, LocalSyntax};
pub use rewriter::{RewriteIssue, RewriteScheme, Rewritten, Verp};
pub use smtp::{SmtpError, SmtpReply, SmtpStage};

pub fn is_valid(email: &str, config: &Config) -> bool {
    Address::parse(email, config).is_valid()
}

/// First validation error of `email`, if any.
pub fn error(email: &str, config: &Config) -> Option<ValidationError> {
    Address::parse(email, config).error()
}

pub fn normal(email: &str, config: &Config) -> String {
    Address::parse(email, config).normal()
}

pub fn canonical(email: &str, config: &Config) -> String {
    Address::parse(email, config).canonical()
}

pub fn redact(email: &str, kind: DigestKind, config: &Config) -> String {
    Address::parse(email, config).redact(kind)
}

pub fn munge(email: &str, config: &Config) -> String {
    Address::parse(email, config).munge()
}

/// MD5 of the chosen form of `email`.
pub fn reference(email: &str, form: AddressForm, config: &Config) -> String {
    Address::parse(email, config).reference(form)
}

pub fn matches<S: AsRef<str>>(email: &str, rules: &[S], config: &Config) -> Option<String> {
    Address::parse(email, config).matches(rules)
}
