use thiserror::Error;

/// Infrastructure failure while talking to DNS.
///
/// "No such record" is never an error: lookups report it as an empty
/// result. Every variant here means the answer is unknown.
#[derive(Debug, Error)]
pub enum DnsError {
    #[error("resolver initialization failed: {source}")]
    ResolverInit {
        #[source]
        source: std::io::Error,
    },
    #[error("{kind} lookup failed for {name}: {source}")]
    Lookup {
        kind: &'static str,
        name: String,
        #[source]
        source: trust_dns_resolver::error::ResolveError,
    },
    #[error("TXT record {name} contains invalid UTF-8 data: {source}")]
    TxtDataUtf8 {
        name: String,
        #[source]
        source: std::str::Utf8Error,
    },
    #[error("DNS unavailable for {name}: {message}")]
    Unavailable { name: String, message: String },
}

impl DnsError {
    pub(crate) fn resolver_init(err: impl std::fmt::Display) -> Self {
        Self::ResolverInit {
            source: std::io::Error::other(err.to_string()),
        }
    }

    pub(crate) fn lookup(
        kind: &'static str,
        name: impl Into<String>,
        source: trust_dns_resolver::error::ResolveError,
    ) -> Self {
        Self::Lookup {
            kind,
            name: name.into(),
            source,
        }
    }

    pub(crate) fn txt_data_utf8(name: impl Into<String>, source: std::str::Utf8Error) -> Self {
        Self::TxtDataUtf8 {
            name: name.into(),
            source,
        }
    }

    pub fn unavailable(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            name: name.into(),
            message: message.into(),
        }
    }
}
