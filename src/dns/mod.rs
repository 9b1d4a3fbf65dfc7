//! DNS collaborator used for MX inference, host validation and TXT lookups.
//!
//! The library talks to DNS only through [`DnsResolver`]. The default
//! implementation is [`SystemResolver`]; [`StaticResolver`] answers from
//! in-memory tables for tests and offline use.

mod error;
mod resolver;
mod stub;
mod types;


use std::net::IpAddr;

pub use error::DnsError;
pub use resolver::SystemResolver;
pub use stub::StaticResolver;
pub use types::MxRecord;

pub trait DnsResolver: Send + Sync {
    /// MX records for `name`; an unregistered name yields an empty list.
    fn lookup_mx(&self, name: &str) -> Result<Vec<MxRecord>, DnsError>;

    /// A/AAAA addresses for `name`; an unregistered name yields an empty list.
    fn lookup_ip(&self, name: &str) -> Result<Vec<IpAddr>, DnsError>;

    /// TXT records for `name`, each record's strings concatenated.
    fn lookup_txt(&self, name: &str) -> Result<Vec<String>, DnsError>;
}

pub(crate) fn fqdn(label: &str, domain: &str) -> String {
    let trimmed = label.trim().trim_end_matches('.');
    if trimmed.is_empty() {
        domain.to_string()
    } else {
        format!("{}.{}", trimmed.to_ascii_lowercase(), domain)
    }
}
