//! Validation outcome vocabulary.
//!
//! Malformed input is never an `Err` at the parsing layer: parts record the
//! first failure as a [`ValidationError`] carrying an [`ErrorKind`], an
//! optional raw diagnostic and the localized message.

mod messages;

use std::fmt;

use thiserror::Error;

pub use messages::message_for;

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidAddress,
    InvalidMailbox,
    LocalSizeShort,
    LocalSizeLong,
    DomainInvalid,
    IncompleteDomain,
    DomainUnknown,
    DomainDoesNotAcceptEmail,
    DomainNoLocalhost,
    DnsUnavailable,
    IpAddressForbidden,
    IpAddressNoLocalhost,
    Ipv4AddressInvalid,
    Ipv6AddressInvalid,
    ExceedsSize,
    NotAllowed,
    ServerNotAvailable,
    AddressUnknown,
    SrsAltered,
    SrsExpired,
}

impl ErrorKind {
    /// Symbolic name, also the key into the message catalog.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidAddress => "invalid_address",
            Self::InvalidMailbox => "invalid_mailbox",
            Self::LocalSizeShort => "local_size_short",
            Self::LocalSizeLong => "local_size_long",
            Self::DomainInvalid => "domain_invalid",
            Self::IncompleteDomain => "incomplete_domain",
            Self::DomainUnknown => "domain_unknown",
            Self::DomainDoesNotAcceptEmail => "domain_does_not_accept_email",
            Self::DomainNoLocalhost => "domain_no_localhost",
            Self::DnsUnavailable => "dns_unavailable",
            Self::IpAddressForbidden => "ip_address_forbidden",
            Self::IpAddressNoLocalhost => "ip_address_no_localhost",
            Self::Ipv4AddressInvalid => "ipv4_address_invalid",
            Self::Ipv6AddressInvalid => "ipv6_address_invalid",
            Self::ExceedsSize => "exceeds_size",
            Self::NotAllowed => "not_allowed",
            Self::ServerNotAvailable => "server_not_available",
            Self::AddressUnknown => "address_unknown",
            Self::SrsAltered => "srs_altered",
            Self::SrsExpired => "srs_expired",
        }
    }

    pub fn message(&self, locale: &str) -> String {
        message_for(self.as_str(), locale)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First failure recorded while validating a part or a whole address.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    pub kind: ErrorKind,
    pub reason: Option<String>,
    pub message: String,
}

impl ValidationError {
    pub fn new(kind: ErrorKind, locale: &str) -> Self {
        Self {
            kind,
            reason: None,
            message: kind.message(locale),
        }
    }

    pub fn with_reason(kind: ErrorKind, reason: impl Into<String>, locale: &str) -> Self {
        Self {
            kind,
            reason: Some(reason.into()),
            message: kind.message(locale),
        }
    }
}
