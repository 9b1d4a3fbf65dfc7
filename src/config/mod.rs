//! Immutable per-parse configuration.
//!
//! A [`Config`] starts from [`Config::default`], is adjusted with the `with_*`
//! builders, and is merged with a provider's overrides once the host's
//! provider is known. Hooks, tables and the DNS collaborators are shared
//! through `Arc`, so cloning is cheap.

mod provider;
mod strategy;


use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

pub use provider::{DEFAULT_PROVIDER, ProviderRegistry, ProviderRule};
pub use strategy::{
    AddressValidator, LocalParser, LocalParts, MailboxCanonicalizer, MailboxValidator,
    MsnMailbox, StripDots,
};

use crate::dns::{DnsResolver, SystemResolver};
use crate::exchanger::ExchangerCache;

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DnsLookup {
    #[default]
    Mx,
    A,
    Off,
}

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocalEncoding {
    #[default]
    Ascii,
    Unicode,
}

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocalFormat {
    #[default]
    Conventional,
    Relaxed,
    Standard,
    Redacted,
    /// Grammar is not checked; sizes and encoding still are.
    Unchecked,
}

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostEncoding {
    #[default]
    Punycode,
    Unicode,
}

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostValidation {
    #[default]
    Mx,
    A,
    Connect,
    Syntax,
}

#[derive(Clone)]
pub struct Config {
    pub dns_lookup: DnsLookup,
    pub dns_timeout: Option<Duration>,
    /// Accept syntactically valid hosts when DNS cannot be reached.
    pub dns_fail_open: bool,
    pub sha1_secret: String,
    pub sha256_secret: String,
    pub munge_string: String,

    pub local_downcase: bool,
    pub local_fix: bool,
    pub local_encoding: LocalEncoding,
    pub local_parse: Option<Arc<dyn LocalParser>>,
    pub local_format: LocalFormat,
    pub local_size: RangeInclusive<usize>,
    pub local_private_size: Option<RangeInclusive<usize>>,
    pub tag_separator: Option<char>,
    pub mailbox_size: RangeInclusive<usize>,
    pub mailbox_canonical: Option<Arc<dyn MailboxCanonicalizer>>,
    pub mailbox_validator: Option<Arc<dyn MailboxValidator>>,

    pub host_encoding: HostEncoding,
    pub host_validation: HostValidation,
    pub host_size: RangeInclusive<usize>,
    pub host_allow_ip: bool,
    pub host_remove_spaces: bool,
    pub host_local: bool,
    pub host_fqdn: bool,
    pub host_auto_append: bool,
    /// SMTP connect/command timeout.
    pub host_timeout: Duration,

    pub address_validator: Option<Arc<dyn AddressValidator>>,
    pub address_size: RangeInclusive<usize>,
    pub address_fqdn_domain: Option<String>,

    pub smtp_helo_name: String,
    pub smtp_mail_from: String,
    pub smtp_port: u16,

    pub srs_secret: Option<String>,
    /// BATV key digit (`'0'..='9'`) to signing secret.
    pub prvs_keys: BTreeMap<char, String>,
    pub prvs_days: i64,

    pub skip_rewrite: bool,
    pub locale: String,

    pub providers: Arc<ProviderRegistry>,
    pub exchanger_cache: Arc<ExchangerCache>,
    resolver: Option<Arc<dyn DnsResolver>>,
    system_resolver: Arc<SystemResolver>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dns_lookup: DnsLookup::Mx,
            dns_timeout: None,
            dns_fail_open: false,
            sha1_secret: String::new(),
            sha256_secret: String::new(),
            munge_string: "*****".to_string(),

            local_downcase: true,
            local_fix: false,
            local_encoding: LocalEncoding::Ascii,
            local_parse: None,
            local_format: LocalFormat::Conventional,
            local_size: 1..=64,
            local_private_size: None,
            tag_separator: Some('+'),
            mailbox_size: 1..=64,
            mailbox_canonical: None,
            mailbox_validator: None,

            host_encoding: HostEncoding::Punycode,
            host_validation: HostValidation::Mx,
            host_size: 1..=253,
            host_allow_ip: false,
            host_remove_spaces: false,
            host_local: false,
            host_fqdn: true,
            host_auto_append: true,
            host_timeout: Duration::from_secs(3),

            address_validator: None,
            address_size: 3..=254,
            address_fqdn_domain: None,

            smtp_helo_name: "localhost".to_string(),
            smtp_mail_from: "postmaster@localhost".to_string(),
            smtp_port: 25,

            srs_secret: None,
            prvs_keys: BTreeMap::new(),
            prvs_days: 30,

            skip_rewrite: false,
            locale: "en".to_string(),

            providers: Arc::new(ProviderRegistry::builtin()),
            exchanger_cache: ExchangerCache::global(),
            resolver: None,
            system_resolver: SystemResolver::shared(),
        }
    }
}

impl Config {
    /// Defaults with every network check switched off.
    pub fn offline() -> Self {
        Self::default()
            .with_dns_lookup(DnsLookup::Off)
            .with_host_validation(HostValidation::Syntax)
    }

    /// Whether host validation and provider inference may query DNS.
    pub fn dns_enabled(&self) -> bool {
        self.dns_lookup != DnsLookup::Off && self.host_validation != HostValidation::Syntax
    }

    /// The injected resolver, or the system resolver.
    pub fn resolver(&self) -> Arc<dyn DnsResolver> {
        if let Some(resolver) = &self.resolver {
            return Arc::clone(resolver);
        }
        let system: Arc<dyn DnsResolver> = self.system_resolver.clone();
        system
    }

    /// This configuration with a provider's overrides applied; provider
    /// values win.
    pub fn merged_with(&self, rule: &ProviderRule) -> Config {
        let mut merged = self.clone();
        if let Some(size) = &rule.local_size {
            merged.local_size = size.clone();
        }
        if rule.local_private_size.is_some() {
            merged.local_private_size = rule.local_private_size.clone();
        }
        if let Some(size) = &rule.mailbox_size {
            merged.mailbox_size = size.clone();
        }
        if let Some(separator) = rule.tag_separator {
            merged.tag_separator = Some(separator);
        }
        if let Some(format) = rule.local_format {
            merged.local_format = format;
        }
        if let Some(canonical) = &rule.mailbox_canonical {
            merged.mailbox_canonical = Some(Arc::clone(canonical));
        }
        if let Some(validator) = &rule.mailbox_validator {
            merged.mailbox_validator = Some(Arc::clone(validator));
        }
        merged
    }

    pub fn with_dns_lookup(mut self, lookup: DnsLookup) -> Self {
        self.dns_lookup = lookup;
        self
    }

    pub fn with_dns_timeout(mut self, timeout: Duration) -> Self {
        self.dns_timeout = Some(timeout);
        self.system_resolver = Arc::new(SystemResolver::new(Some(timeout)));
        self
    }

    pub fn with_dns_fail_open(mut self, fail_open: bool) -> Self {
        self.dns_fail_open = fail_open;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn DnsResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_exchanger_cache(mut self, cache: Arc<ExchangerCache>) -> Self {
        self.exchanger_cache = cache;
        self
    }

    pub fn with_providers(mut self, providers: ProviderRegistry) -> Self {
        self.providers = Arc::new(providers);
        self
    }

    pub fn with_secrets(mut self, sha1: impl Into<String>, sha256: impl Into<String>) -> Self {
        self.sha1_secret = sha1.into();
        self.sha256_secret = sha256.into();
        self
    }

    pub fn with_munge_string(mut self, munge: impl Into<String>) -> Self {
        self.munge_string = munge.into();
        self
    }

    pub fn with_local_downcase(mut self, downcase: bool) -> Self {
        self.local_downcase = downcase;
        self
    }

    pub fn with_local_fix(mut self, fix: bool) -> Self {
        self.local_fix = fix;
        self
    }

    pub fn with_local_encoding(mut self, encoding: LocalEncoding) -> Self {
        self.local_encoding = encoding;
        self
    }

    pub fn with_local_format(mut self, format: LocalFormat) -> Self {
        self.local_format = format;
        self
    }

    pub fn with_local_parser(mut self, parser: impl LocalParser + 'static) -> Self {
        self.local_parse = Some(Arc::new(parser));
        self
    }

    pub fn with_local_size(mut self, size: RangeInclusive<usize>) -> Self {
        self.local_size = size;
        self
    }

    pub fn with_mailbox_size(mut self, size: RangeInclusive<usize>) -> Self {
        self.mailbox_size = size;
        self
    }

    pub fn with_tag_separator(mut self, separator: Option<char>) -> Self {
        self.tag_separator = separator;
        self
    }

    pub fn with_mailbox_canonical(mut self, canonical: impl MailboxCanonicalizer + 'static) -> Self {
        self.mailbox_canonical = Some(Arc::new(canonical));
        self
    }

    pub fn with_mailbox_validator(mut self, validator: impl MailboxValidator + 'static) -> Self {
        self.mailbox_validator = Some(Arc::new(validator));
        self
    }

    pub fn with_host_encoding(mut self, encoding: HostEncoding) -> Self {
        self.host_encoding = encoding;
        self
    }

    pub fn with_host_validation(mut self, validation: HostValidation) -> Self {
        self.host_validation = validation;
        self
    }

    pub fn with_host_allow_ip(mut self, allow: bool) -> Self {
        self.host_allow_ip = allow;
        self
    }

    pub fn with_host_remove_spaces(mut self, remove: bool) -> Self {
        self.host_remove_spaces = remove;
        self
    }

    pub fn with_host_local(mut self, allow: bool) -> Self {
        self.host_local = allow;
        self
    }

    pub fn with_host_fqdn(mut self, require: bool) -> Self {
        self.host_fqdn = require;
        self
    }

    pub fn with_host_timeout(mut self, timeout: Duration) -> Self {
        self.host_timeout = timeout;
        self
    }

    pub fn with_address_validator(mut self, validator: impl AddressValidator + 'static) -> Self {
        self.address_validator = Some(Arc::new(validator));
        self
    }

    pub fn with_address_size(mut self, size: RangeInclusive<usize>) -> Self {
        self.address_size = size;
        self
    }

    pub fn with_address_fqdn_domain(mut self, domain: impl Into<String>) -> Self {
        self.address_fqdn_domain = Some(domain.into());
        self
    }

    pub fn with_smtp_port(mut self, port: u16) -> Self {
        self.smtp_port = port;
        self
    }

    pub fn with_srs_secret(mut self, secret: impl Into<String>) -> Self {
        self.srs_secret = Some(secret.into());
        self
    }

    pub fn with_prvs_key(mut self, digit: char, secret: impl Into<String>) -> Self {
        self.prvs_keys.insert(digit, secret.into());
        self
    }

    pub fn with_skip_rewrite(mut self, skip: bool) -> Self {
        self.skip_rewrite = skip;
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("dns_lookup", &self.dns_lookup)
            .field("dns_timeout", &self.dns_timeout)
            .field("dns_fail_open", &self.dns_fail_open)
            .field("local_format", &self.local_format)
            .field("local_encoding", &self.local_encoding)
            .field("local_size", &self.local_size)
            .field("local_private_size", &self.local_private_size)
            .field("tag_separator", &self.tag_separator)
            .field("mailbox_size", &self.mailbox_size)
            .field("host_encoding", &self.host_encoding)
            .field("host_validation", &self.host_validation)
            .field("host_allow_ip", &self.host_allow_ip)
            .field("host_local", &self.host_local)
            .field("host_fqdn", &self.host_fqdn)
            .field("address_size", &self.address_size)
            .field("address_fqdn_domain", &self.address_fqdn_domain)
            .field("locale", &self.locale)
            .finish_non_exhaustive()
    }
}
