//! The domain (right-hand) side of an address.
//!
//! [`Host::parse`] normalizes the raw text: comments are removed, IP
//! literals (`[1.2.3.4]`, `[IPv6:::1]`) are recognized, names are
//! lowercased, completed with the configured FQDN domain and converted to
//! punycode for DNS. Provider resolution, the exchanger and the validation
//! outcome are computed on first use and memoized.

pub mod segment;
mod validate;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;
use std::sync::{Arc, LazyLock, OnceLock};

use regex::Regex;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

use crate::config::{Config, DEFAULT_PROVIDER, HostEncoding, ProviderRegistry};
use crate::dmarc::{self, DmarcRecord};
use crate::dns::{self, DnsError};
use crate::error::ValidationError;
use crate::exchanger::Exchanger;
use crate::local::{self, split_comment};
use crate::matcher;

pub use segment::Segments;

static IPV6_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\[IPv6:(.+)\]$").expect("static regex"));
static IPV4_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(\d{1,3}(?:\.\d{1,3}){3})\]$").expect("static regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IpLiteral {
    V4,
    V6,
}

/// Host components, as returned by [`Host::parts`].
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostParts {
    pub host_name: String,
    pub dns_name: String,
    pub subdomains: Option<String>,
    pub registration_name: Option<String>,
    pub domain_name: Option<String>,
    pub tld: Option<String>,
    pub tld2: Option<String>,
    pub ip_address: Option<String>,
    pub comment: Option<String>,
}

#[derive(Clone)]
struct Resolution {
    provider: String,
    host_match: Vec<String>,
    config: Config,
}

#[derive(Clone)]
pub struct Host {
    original: String,
    host_name: String,
    dns_name: String,
    ip_address: Option<String>,
    literal: Option<IpLiteral>,
    segments: Option<Segments>,
    comment: Option<String>,
    config: Config,
    resolution: OnceLock<Resolution>,
    exchanger: OnceLock<Arc<Exchanger>>,
    validation: OnceLock<Result<(), ValidationError>>,
}

impl Host {
    pub fn parse(raw: &str, config: &Config) -> Self {
        let (rest, comment) = split_comment(raw.trim());
        let mut host = Self {
            original: raw.to_string(),
            host_name: String::new(),
            dns_name: String::new(),
            ip_address: None,
            literal: None,
            segments: None,
            comment,
            config: config.clone(),
            resolution: OnceLock::new(),
            exchanger: OnceLock::new(),
            validation: OnceLock::new(),
        };

        if let Some(caps) = IPV6_LITERAL.captures(&rest) {
            host.ip_address = Some(caps[1].to_string());
            host.literal = Some(IpLiteral::V6);
            return host;
        }
        if let Some(caps) = IPV4_LITERAL.captures(&rest) {
            host.ip_address = Some(caps[1].to_string());
            host.literal = Some(IpLiteral::V4);
            return host;
        }

        let lowered: String = rest.nfc().collect::<String>().to_lowercase();
        let mut name = fully_qualified(lowered, config);
        if config.host_remove_spaces {
            name.retain(|c| c != ' ');
        }
        host.dns_name = if name.is_ascii() {
            name.clone()
        } else {
            idna::domain_to_ascii(&name).unwrap_or_else(|err| {
                debug!(host = %name, error = ?err, "punycode conversion failed");
                name.clone()
            })
        };
        host.segments = Some(segment::segment(&name));
        host.host_name = name;
        host
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    /// Lowercased (Unicode) name; empty for IP literals.
    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    /// ASCII (punycode) form used for DNS; empty for IP literals.
    pub fn dns_name(&self) -> &str {
        &self.dns_name
    }

    /// The bracketed address text, without brackets or `IPv6:` prefix.
    pub fn ip_address(&self) -> Option<&str> {
        self.ip_address.as_deref()
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn subdomains(&self) -> Option<&str> {
        self.segments.as_ref().and_then(|s| s.subdomains.as_deref())
    }

    pub fn registration_name(&self) -> Option<&str> {
        self.segments
            .as_ref()
            .map(|s| s.registration_name.as_str())
            .filter(|name| !name.is_empty())
    }

    pub fn domain_name(&self) -> Option<&str> {
        self.segments
            .as_ref()
            .map(|s| s.domain_name.as_str())
            .filter(|name| !name.is_empty())
    }

    pub fn tld(&self) -> Option<&str> {
        self.segments.as_ref().and_then(|s| s.tld.as_deref())
    }

    pub fn tld2(&self) -> Option<&str> {
        self.segments.as_ref().and_then(|s| s.tld2.as_deref())
    }

    pub fn parts(&self) -> HostParts {
        HostParts {
            host_name: self.host_name.clone(),
            dns_name: self.dns_name.clone(),
            subdomains: self.subdomains().map(str::to_string),
            registration_name: self.registration_name().map(str::to_string),
            domain_name: self.domain_name().map(str::to_string),
            tld: self.tld().map(str::to_string),
            tld2: self.tld2().map(str::to_string),
            ip_address: self.ip_address.clone(),
            comment: self.comment.clone(),
        }
    }

    pub fn is_ip(&self) -> bool {
        self.literal.is_some()
    }

    pub fn is_ipv4(&self) -> bool {
        self.literal == Some(IpLiteral::V4)
    }

    pub fn is_ipv6(&self) -> bool {
        self.literal == Some(IpLiteral::V6)
    }

    /// The literal parsed as an address, if it is one.
    pub fn ip(&self) -> Option<IpAddr> {
        self.ip_address.as_deref().and_then(|ip| ip.parse().ok())
    }

    /// A recognized TLD is present.
    pub fn is_fqdn(&self) -> bool {
        self.tld().is_some()
    }

    pub fn is_localhost(&self) -> bool {
        match self.literal {
            Some(_) => self.ip().is_some_and(|ip| ip.is_loopback()),
            None => self.host_name == "localhost",
        }
    }

    /// Rendered name: `[ip]`, `[IPv6:ip]`, or the name in the configured
    /// encoding.
    pub fn name(&self) -> String {
        match (self.literal, &self.ip_address) {
            (Some(IpLiteral::V6), Some(ip)) => format!("[IPv6:{ip}]"),
            (Some(IpLiteral::V4), Some(ip)) => format!("[{ip}]"),
            _ => match self.config.host_encoding {
                HostEncoding::Unicode => idna::domain_to_unicode(&self.dns_name).0,
                HostEncoding::Punycode => self.dns_name.clone(),
            },
        }
    }

    /// Punycode name; IP literals render bracketed.
    pub fn canonical(&self) -> String {
        if self.is_ip() {
            self.name()
        } else {
            self.dns_name.clone()
        }
    }

    pub fn munge(&self) -> String {
        if self.host_name.is_empty() {
            return self.name();
        }
        local::munge(&self.host_name, &self.config.munge_string)
    }

    /// Name of the resolved provider.
    pub fn provider(&self) -> &str {
        &self.resolution().provider
    }

    /// Configuration with the provider's overrides merged in.
    pub fn config(&self) -> &Config {
        &self.resolution().config
    }

    /// The configuration this host was parsed with.
    pub(crate) fn base_config(&self) -> &Config {
        &self.config
    }

    /// Whether this is a custom domain served by a provider whose own
    /// domains it does not match (e.g. a company domain on Google mail).
    pub fn is_hosted_service(&self) -> bool {
        let resolution = self.resolution();
        self.registration_name().is_some()
            && !resolution.host_match.is_empty()
            && self.match_rules(&resolution.host_match, false).is_none()
    }

    /// First rule that matches this host; see [`crate::matcher`] for the
    /// rule forms.
    pub fn matches<S: AsRef<str>>(&self, rules: &[S]) -> Option<String> {
        self.match_rules(rules, true)
    }

    /// Memoized exchanger for [`Host::dns_name`]. Its MX answer is shared
    /// through the configured cache.
    pub fn exchanger(&self) -> &Arc<Exchanger> {
        self.exchanger
            .get_or_init(|| Arc::new(Exchanger::new(self.dns_name.as_str(), &self.config)))
    }

    /// TXT records of `name` (default: this host) joined by a space.
    pub fn txt(&self, name: Option<&str>) -> Result<Option<String>, DnsError> {
        let records = self
            .config
            .resolver()
            .lookup_txt(name.unwrap_or(&self.dns_name))?;
        if records.is_empty() {
            Ok(None)
        } else {
            Ok(Some(records.join(" ")))
        }
    }

    /// The TXT record of `name` read as `key=value;` pairs.
    pub fn txt_hash(&self, name: Option<&str>) -> Result<BTreeMap<String, String>, DnsError> {
        Ok(self
            .txt(name)?
            .map(|record| dmarc::parse_tags(&record))
            .unwrap_or_default())
    }

    pub fn dmarc(&self) -> Result<Option<DmarcRecord>, DnsError> {
        if self.dns_name.is_empty() {
            return Ok(None);
        }
        let records = self
            .config
            .resolver()
            .lookup_txt(&dns::fqdn("_dmarc", &self.dns_name))?;
        Ok(DmarcRecord::select(&records))
    }

    /// Servers to probe over SMTP: exchangers by preference, else the host.
    pub(crate) fn smtp_targets(&self) -> Vec<String> {
        if let Some(ip) = self.ip() {
            return vec![ip.to_string()];
        }
        let mut hosts = self.exchanger().mx_hosts().to_vec();
        hosts.sort_by_key(|mx| mx.preference);
        let mut targets: Vec<String> = hosts.into_iter().map(|mx| mx.host).collect();
        if targets.is_empty() && !self.dns_name.is_empty() {
            targets.push(self.dns_name.clone());
        }
        targets
    }

    fn resolution(&self) -> &Resolution {
        self.resolution.get_or_init(|| self.resolve_provider())
    }

    fn resolve_provider(&self) -> Resolution {
        let registry = Arc::clone(&self.config.providers);
        if !self.is_ip() && !self.host_name.is_empty() {
            let by_host = registry.rules().find(|rule| {
                !rule.host_match.is_empty() && self.match_rules(&rule.host_match, false).is_some()
            });
            if let Some(rule) = by_host {
                return self.resolution_for(&registry, &rule.name);
            }
            if self.config.dns_enabled() && self.is_fqdn() {
                let name = self.exchanger().provider().to_string();
                return self.resolution_for(&registry, &name);
            }
        }
        self.resolution_for(&registry, DEFAULT_PROVIDER)
    }

    fn resolution_for(&self, registry: &ProviderRegistry, name: &str) -> Resolution {
        let rule = registry
            .get(name)
            .unwrap_or_else(|| registry.default_rule().clone());
        debug!(host = %self.host_name, provider = %rule.name, "provider resolved");
        Resolution {
            provider: rule.name.clone(),
            host_match: rule.host_match.clone(),
            config: self.config.merged_with(&rule),
        }
    }

    fn match_rules<S: AsRef<str>>(&self, rules: &[S], with_provider: bool) -> Option<String> {
        rules
            .iter()
            .map(AsRef::as_ref)
            .find(|rule| self.rule_matches(rule, with_provider))
            .map(str::to_string)
    }

    fn rule_matches(&self, rule: &str, with_provider: bool) -> bool {
        if let Some(ip) = self.ip() {
            return matcher::ip_matches(rule, ip);
        }
        let Some(segments) = &self.segments else {
            return false;
        };
        if rule.is_empty() {
            return false;
        }
        if segments.domain_name == rule || self.dns_name == rule {
            return true;
        }
        if let Some(registration) = rule.strip_suffix('.') {
            if !registration.is_empty() && segments.registration_name == registration {
                return true;
            }
        }
        if let Some(tld) = rule.strip_prefix('.') {
            if segments.tld.as_deref() == Some(tld) || segments.tld2.as_deref() == Some(tld) {
                return true;
            }
        }
        let pattern = rule.strip_prefix('@').unwrap_or(rule);
        if matcher::glob_matches(pattern, &segments.domain_name)
            || matcher::glob_matches(pattern, &self.dns_name)
        {
            return true;
        }
        with_provider && matcher::is_provider_word(rule) && self.provider() == rule
    }
}

/// Completes a bare name: with `address_fqdn_domain`, an empty host becomes
/// that domain and an undotted host gets it appended; without it, an empty
/// host becomes `localhost` when local hosts are allowed.
fn fully_qualified(name: String, config: &Config) -> String {
    if !config.host_auto_append {
        return name;
    }
    let blank = name.trim().is_empty();
    match &config.address_fqdn_domain {
        Some(domain) if blank => domain.to_lowercase(),
        Some(domain) if !name.contains('.') => format!("{name}.{}", domain.to_lowercase()),
        None if blank && config.host_local => "localhost".to_string(),
        _ => name,
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("original", &self.original)
            .field("host_name", &self.host_name)
            .field("dns_name", &self.dns_name)
            .field("ip_address", &self.ip_address)
            .field("comment", &self.comment)
            .finish_non_exhaustive()
    }
}
