//! Mail-exchanger lookup and provider inference.
//!
//! An [`Exchanger`] wraps one host name's MX answer under one
//! configuration. The answer is fetched on first use and memoized;
//! [`ExchangerCache`] keeps a bounded set of raw answers so repeated
//! validations of one domain through one resolver share a lookup. Provider
//! inference always uses the exchanger's own registry.

mod cache;


use std::net::IpAddr;
use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::config::{Config, DEFAULT_PROVIDER, ProviderRegistry};
use crate::dns::DnsResolver;
use crate::host::segment;
use crate::matcher;

pub use cache::ExchangerCache;

/// One resolved mail exchanger.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MxHost {
    pub host: String,
    /// First address of `host`, if it resolved.
    pub ip: Option<IpAddr>,
    pub preference: u16,
}

/// Outcome of the MX query.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MxLookup {
    Found(Vec<MxHost>),
    /// The name has no MX records (or does not exist).
    NotFound,
    /// DNS could not answer; carries the resolver's error text.
    Unavailable(String),
    /// DNS lookups are switched off by configuration.
    Disabled,
}

impl MxLookup {
    pub fn hosts(&self) -> &[MxHost] {
        match self {
            Self::Found(hosts) => hosts.as_slice(),
            _ => &[],
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

pub struct Exchanger {
    host: String,
    dns_enabled: bool,
    resolver: Arc<dyn DnsResolver>,
    providers: Arc<ProviderRegistry>,
    cache: Arc<ExchangerCache>,
    lookup: OnceLock<MxLookup>,
    provider: OnceLock<String>,
}

impl Exchanger {
    pub fn new(host: impl Into<String>, config: &Config) -> Self {
        Self {
            host: host.into(),
            dns_enabled: config.dns_enabled(),
            resolver: config.resolver(),
            providers: Arc::clone(&config.providers),
            cache: Arc::clone(&config.exchanger_cache),
            lookup: OnceLock::new(),
            provider: OnceLock::new(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn lookup(&self) -> &MxLookup {
        self.lookup.get_or_init(|| {
            if !self.dns_enabled {
                return MxLookup::Disabled;
            }
            self.cache.answer(&self.host, &self.resolver, || self.fetch())
        })
    }

    pub fn mx_hosts(&self) -> &[MxHost] {
        self.lookup().hosts()
    }

    /// Routable exchanger addresses; unspecified addresses (`0.0.0.0`, `::`)
    /// are left out.
    pub fn mx_ips(&self) -> Vec<IpAddr> {
        self.mx_hosts()
            .iter()
            .filter_map(|mx| mx.ip)
            .filter(|ip| !ip.is_unspecified())
            .collect()
    }

    /// Registered domains of the exchanger hosts, sorted and deduplicated.
    pub fn domains(&self) -> Vec<String> {
        let mut domains: Vec<String> = self
            .mx_hosts()
            .iter()
            .map(|mx| segment::segment(&mx.host).domain_name)
            .collect();
        domains.sort();
        domains.dedup();
        domains
    }

    /// Name of the first provider whose exchanger rules match, else
    /// `default`.
    pub fn provider(&self) -> &str {
        self.provider.get_or_init(|| {
            let name = self
                .providers
                .rules()
                .find(|rule| {
                    !rule.exchanger_match.is_empty() && self.matches(&rule.exchanger_match).is_some()
                })
                .map(|rule| rule.name.clone())
                .unwrap_or_else(|| DEFAULT_PROVIDER.to_string());
            debug!(host = %self.host, provider = %name, "exchanger provider");
            name
        })
    }

    /// First rule matching an exchanger: CIDR/IP rules against the MX
    /// addresses, others as a suffix or glob of the MX host names.
    pub fn matches<S: AsRef<str>>(&self, rules: &[S]) -> Option<String> {
        rules
            .iter()
            .map(AsRef::as_ref)
            .find(|rule| self.rule_matches(rule))
            .map(str::to_string)
    }

    fn rule_matches(&self, rule: &str) -> bool {
        if rule.contains('/') {
            return self.in_cidr(rule);
        }
        self.mx_hosts()
            .iter()
            .any(|mx| mx.host.ends_with(rule) || matcher::glob_matches(rule, &mx.host))
    }

    pub fn in_cidr(&self, cidr: &str) -> bool {
        self.mx_ips().into_iter().any(|ip| matcher::ip_matches(cidr, ip))
    }

    fn fetch(&self) -> MxLookup {
        let mut records = match self.resolver.lookup_mx(&self.host) {
            Ok(records) => records,
            Err(err) => {
                debug!(host = %self.host, error = %err, "mx lookup unavailable");
                return MxLookup::Unavailable(err.to_string());
            }
        };
        records.sort();

        let hosts: Vec<MxHost> = records
            .into_iter()
            // a null MX ("." exchange) means the domain refuses mail
            .filter(|record| !record.exchange.trim().is_empty())
            .map(|record| {
                let ip = match self.resolver.lookup_ip(&record.exchange) {
                    Ok(ips) => ips.into_iter().next(),
                    Err(err) => {
                        debug!(exchange = %record.exchange, error = %err, "mx address lookup failed");
                        None
                    }
                };
                MxHost {
                    host: record.exchange,
                    ip,
                    preference: record.preference,
                }
            })
            .collect();

        debug!(host = %self.host, count = hosts.len(), "mx lookup");
        if hosts.is_empty() {
            MxLookup::NotFound
        } else {
            MxLookup::Found(hosts)
        }
    }
}

impl std::fmt::Debug for Exchanger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exchanger")
            .field("host", &self.host)
            .field("dns_enabled", &self.dns_enabled)
            .field("lookup", &self.lookup.get())
            .finish_non_exhaustive()
    }
}
