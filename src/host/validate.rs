use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::{Host, IpLiteral};
use crate::config::{Config, DnsLookup, HostValidation};
use crate::error::{ErrorKind, ValidationError};
use crate::exchanger::MxLookup;
use crate::smtp;

// labels of letters/digits joined by `.`, `-` or `--` (punycode)
static CANONICAL_HOST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\p{L}\p{N}]+(?:(?:-{1,2}|\.)[\p{L}\p{N}]+)*$").expect("static regex")
});

impl Host {
    /// Syntax, policy, then the configured DNS or SMTP check. The outcome
    /// is memoized.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validation
            .get_or_init(|| self.run_validation())
            .clone()
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn error(&self) -> Option<ValidationError> {
        self.validate().err()
    }

    fn run_validation(&self) -> Result<(), ValidationError> {
        let config = self.config();
        if let Some(literal) = self.literal {
            return self.validate_ip(literal, config);
        }
        self.validate_format(config)?;
        if self.is_localhost() && !config.host_local {
            return Err(fail(ErrorKind::DomainNoLocalhost, config));
        }
        if config.dns_lookup == DnsLookup::Off {
            return Ok(());
        }
        match config.host_validation {
            HostValidation::Syntax => Ok(()),
            HostValidation::A => self.validate_a_record(config),
            HostValidation::Mx if config.dns_lookup == DnsLookup::A => {
                self.validate_a_record(config)
            }
            HostValidation::Mx => self.validate_mx(config),
            HostValidation::Connect => {
                self.validate_mx(config)?;
                self.validate_connect(config)
            }
        }
    }

    fn validate_ip(&self, literal: IpLiteral, config: &Config) -> Result<(), ValidationError> {
        if !config.host_allow_ip {
            return Err(fail(ErrorKind::IpAddressForbidden, config));
        }
        let text = self.ip_address.as_deref().unwrap_or_default();
        match literal {
            IpLiteral::V6 if text.parse::<Ipv6Addr>().is_err() => {
                return Err(fail(ErrorKind::Ipv6AddressInvalid, config));
            }
            IpLiteral::V4 if text.parse::<Ipv4Addr>().is_err() => {
                return Err(fail(ErrorKind::Ipv4AddressInvalid, config));
            }
            _ => {}
        }
        if self.is_localhost() && !config.host_local {
            return Err(fail(ErrorKind::IpAddressNoLocalhost, config));
        }
        Ok(())
    }

    fn validate_format(&self, config: &Config) -> Result<(), ValidationError> {
        if self.host_name.is_empty()
            || !CANONICAL_HOST.is_match(&self.host_name)
            || !config.host_size.contains(&self.dns_name.chars().count())
        {
            return Err(fail(ErrorKind::DomainInvalid, config));
        }
        if self.is_localhost() || !config.host_fqdn {
            return Ok(());
        }
        if !self.host_name.contains('.') {
            return Err(fail(ErrorKind::IncompleteDomain, config));
        }
        if !self.is_fqdn() {
            return Err(fail(ErrorKind::DomainInvalid, config));
        }
        Ok(())
    }

    fn validate_a_record(&self, config: &Config) -> Result<(), ValidationError> {
        match config.resolver().lookup_ip(&self.dns_name) {
            Ok(ips) if !ips.is_empty() => Ok(()),
            Ok(_) => Err(fail(ErrorKind::DomainUnknown, config)),
            Err(err) => outage(&self.dns_name, &err.to_string(), config),
        }
    }

    /// Accepts mail when an exchanger resolves to a routable address. A
    /// domain with an address but no usable exchanger does not accept
    /// mail; one with neither is unknown.
    fn validate_mx(&self, config: &Config) -> Result<(), ValidationError> {
        let exchanger = self.exchanger();
        match exchanger.lookup() {
            MxLookup::Disabled => return Ok(()),
            MxLookup::Unavailable(reason) => return outage(&self.dns_name, reason, config),
            MxLookup::Found(_) if !exchanger.mx_ips().is_empty() => return Ok(()),
            MxLookup::Found(_) | MxLookup::NotFound => {}
        }
        match config.resolver().lookup_ip(&self.dns_name) {
            Ok(ips) if !ips.is_empty() => Err(fail(ErrorKind::DomainDoesNotAcceptEmail, config)),
            Ok(_) => Err(fail(ErrorKind::DomainUnknown, config)),
            Err(err) => outage(&self.dns_name, &err.to_string(), config),
        }
    }

    fn validate_connect(&self, config: &Config) -> Result<(), ValidationError> {
        smtp::probe(&self.smtp_targets(), config, None)
            .map(|_| ())
            .map_err(|err| {
                ValidationError::with_reason(
                    ErrorKind::ServerNotAvailable,
                    err.to_string(),
                    &config.locale,
                )
            })
    }
}

fn fail(kind: ErrorKind, config: &Config) -> ValidationError {
    ValidationError::new(kind, &config.locale)
}

/// DNS could not answer: accept when failing open, else report the outage.
fn outage(host: &str, reason: &str, config: &Config) -> Result<(), ValidationError> {
    if config.dns_fail_open {
        debug!(host, reason, "dns unavailable, failing open");
        return Ok(());
    }
    Err(ValidationError::with_reason(
        ErrorKind::DnsUnavailable,
        reason,
        &config.locale,
    ))
}
