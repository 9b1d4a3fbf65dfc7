//! Rule vocabulary shared by hosts, local parts, addresses and exchangers.
//!
//! * `name.` matches a registration name
//! * `.tld` / `.co.uk` matches a one- or two-label TLD
//! * shell globs (`yah*.jp`, `user*@`) match rendered names
//! * a bare word (`google`) matches a provider name
//! * `a.b.c.d`, `a.b.c.0/24` or IPv6 equivalents match IP addresses

use std::net::IpAddr;

use glob::Pattern;
use ipnet::IpNet;

/// Shell-style glob; `*` also matches `.` and `@`.
pub fn glob_matches(pattern: &str, candidate: &str) -> bool {
    match Pattern::new(pattern) {
        Ok(compiled) => compiled.matches(candidate),
        Err(_) => pattern == candidate,
    }
}

/// CIDR containment when `rule` has a prefix length, plain equality
/// otherwise. Never matches across address families.
pub fn ip_matches(rule: &str, ip: IpAddr) -> bool {
    if rule.contains('/') {
        return rule
            .parse::<IpNet>()
            .map(|net| net.contains(&ip))
            .unwrap_or(false);
    }
    rule.parse::<IpAddr>().map(|addr| addr == ip).unwrap_or(false)
}

/// A rule made only of word characters and hyphens names a provider.
pub(crate) fn is_provider_word(rule: &str) -> bool {
    !rule.is_empty()
        && rule
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
