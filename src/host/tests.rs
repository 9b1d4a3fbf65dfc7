use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use super::*;
use crate::config::{HostEncoding, HostValidation};
use crate::dmarc::DmarcPolicy;
use crate::dns::StaticResolver;
use crate::error::ErrorKind;
use crate::exchanger::ExchangerCache;

fn ip(a: u8, b: u8, c: u8, d: u8) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(a, b, c, d))
}

fn parse(raw: &str) -> Host {
    Host::parse(raw, &Config::offline())
}

fn kind(host: &Host) -> Option<ErrorKind> {
    host.error().map(|err| err.kind)
}

fn online(resolver: StaticResolver) -> Config {
    Config::default()
        .with_resolver(Arc::new(resolver))
        .with_exchanger_cache(Arc::new(ExchangerCache::new(8)))
}

#[test]
fn segments_two_label_tld() {
    let host = parse("my.yahoo.co.jp");
    assert_eq!(host.host_name(), "my.yahoo.co.jp");
    assert_eq!(host.subdomains(), Some("my"));
    assert_eq!(host.registration_name(), Some("yahoo"));
    assert_eq!(host.domain_name(), Some("yahoo.co.jp"));
    assert_eq!(host.tld(), Some("jp"));
    assert_eq!(host.tld2(), Some("co.jp"));
    assert_eq!(host.provider(), "yahoo");
    assert!(host.is_valid());
}

#[test]
fn unicode_hosts_use_punycode_for_dns() {
    let host = parse("Å.com");
    assert_eq!(host.host_name(), "å.com");
    assert_eq!(host.dns_name(), "xn--5ca.com");
    assert_eq!(host.name(), "xn--5ca.com");
    assert_eq!(host.canonical(), "xn--5ca.com");
    assert!(host.is_valid());

    let unicode = Config::offline().with_host_encoding(HostEncoding::Unicode);
    assert_eq!(Host::parse("xn--5ca.com", &unicode).name(), "å.com");
}

#[test]
fn comments_are_removed() {
    for raw in ["(oops)gmail.com", "gmail.com(oops)"] {
        let host = parse(raw);
        assert_eq!(host.host_name(), "gmail.com", "{raw}");
        assert_eq!(host.comment(), Some("oops"), "{raw}");
        assert_eq!(host.original(), raw);
    }
}

#[test]
fn rule_matching() {
    let host = parse("my.yahoo.co.jp");
    assert_eq!(host.matches(&["yahoo.co.jp"]), Some("yahoo.co.jp".to_string()));
    assert_eq!(host.matches(&["yahoo."]), Some("yahoo.".to_string()));
    assert_eq!(host.matches(&[".co.jp"]), Some(".co.jp".to_string()));
    assert_eq!(host.matches(&[".jp"]), Some(".jp".to_string()));
    assert_eq!(host.matches(&["yah*.jp"]), Some("yah*.jp".to_string()));
    assert_eq!(host.matches(&["@yah*.jp"]), Some("@yah*.jp".to_string()));
    assert_eq!(host.matches(&["yahoo"]), Some("yahoo".to_string()));
    assert_eq!(host.matches(&["gmail.com", "google"]), None);
    assert_eq!(
        host.matches(&["example.com", ".jp"]),
        Some(".jp".to_string())
    );
}

#[test]
fn ip_literal_rules() {
    let host = parse("[123.123.123.8]");
    assert!(host.is_ipv4());
    assert_eq!(host.name(), "[123.123.123.8]");
    assert_eq!(host.matches(&["123.123.123.0/24"]), Some("123.123.123.0/24".to_string()));
    assert_eq!(host.matches(&["123.123.123.8"]), Some("123.123.123.8".to_string()));
    assert_eq!(host.matches(&["123.123.124.0/24", "2001:db8::/32"]), None);
    assert_eq!(host.provider(), "default");
}

#[test]
fn munge_keeps_two_characters() {
    assert_eq!(parse("example.com").munge(), "ex*****");
}

#[test]
fn ip_literal_policy() {
    assert_eq!(kind(&parse("[127.0.0.1]")), Some(ErrorKind::IpAddressForbidden));

    let allow_ip = Config::offline().with_host_allow_ip(true);
    assert_eq!(
        kind(&Host::parse("[127.0.0.1]", &allow_ip)),
        Some(ErrorKind::IpAddressNoLocalhost)
    );
    assert_eq!(
        kind(&Host::parse("[127.0.0.666]", &allow_ip)),
        Some(ErrorKind::Ipv4AddressInvalid)
    );
    assert_eq!(
        kind(&Host::parse("[IPv6::12t]", &allow_ip)),
        Some(ErrorKind::Ipv6AddressInvalid)
    );
    assert!(Host::parse("[192.0.2.1]", &allow_ip).is_valid());

    let local = allow_ip.with_host_local(true);
    assert!(Host::parse("[127.0.0.1]", &local).is_valid());
    let v6 = Host::parse("[IPv6:::1]", &local);
    assert!(v6.is_ipv6());
    assert_eq!(v6.name(), "[IPv6:::1]");
    assert!(v6.is_valid());
}

#[test]
fn spaces_are_invalid_unless_removed() {
    assert_eq!(kind(&parse("ya  hoo.com")), Some(ErrorKind::DomainInvalid));
    let remove = Config::offline().with_host_remove_spaces(true);
    let host = Host::parse("ya  hoo.com", &remove);
    assert_eq!(host.host_name(), "yahoo.com");
    assert!(host.is_valid());
}

#[test]
fn incomplete_and_malformed_names() {
    assert_eq!(kind(&parse("example")), Some(ErrorKind::IncompleteDomain));
    assert_eq!(kind(&parse("sss.c")), Some(ErrorKind::DomainInvalid));
    assert_eq!(kind(&parse("bad_name.com")), Some(ErrorKind::DomainInvalid));
    assert_eq!(kind(&parse("-lead.com")), Some(ErrorKind::DomainInvalid));
    assert_eq!(kind(&parse("")), Some(ErrorKind::DomainInvalid));

    let lax = Config::offline().with_host_fqdn(false);
    assert!(Host::parse("example", &lax).is_valid());
}

#[test]
fn localhost_requires_opt_in() {
    assert_eq!(kind(&parse("localhost")), Some(ErrorKind::DomainNoLocalhost));
    let local = Config::offline().with_host_local(true);
    assert!(Host::parse("localhost", &local).is_valid());
    assert_eq!(Host::parse("", &local).host_name(), "localhost");
}

#[test]
fn dotless_host_has_no_registration_name() {
    let host = Host::parse("localhost", &Config::offline().with_host_local(true));
    assert_eq!(host.subdomains(), Some("localhost"));
    assert_eq!(host.registration_name(), None);
    assert_eq!(host.domain_name(), None);
    assert_eq!(host.tld(), None);
    assert!(!host.is_hosted_service());
    assert_eq!(host.matches(&["localhost"]), Some("localhost".to_string()));
    assert_eq!(host.matches(&["."]), None);
}

#[test]
fn fqdn_domain_completes_bare_hosts() {
    let config = Config::offline().with_address_fqdn_domain("Example.com");
    assert_eq!(Host::parse("", &config).host_name(), "example.com");
    assert_eq!(Host::parse("mail", &config).host_name(), "mail.example.com");
    assert_eq!(Host::parse("other.org", &config).host_name(), "other.org");
}

#[test]
fn mx_validation() {
    let resolver = StaticResolver::new()
        .with_mx("example.com", 10, "mx.example.com")
        .with_ip("mx.example.com", ip(192, 0, 2, 10))
        .with_ip("web-only.com", ip(192, 0, 2, 20))
        .with_mx("null-mx.com", 0, "0.0.0.0.example")
        .with_ip("0.0.0.0.example", IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    let config = online(resolver);

    assert!(Host::parse("example.com", &config).is_valid());
    assert_eq!(
        kind(&Host::parse("web-only.com", &config)),
        Some(ErrorKind::DomainDoesNotAcceptEmail)
    );
    assert_eq!(
        kind(&Host::parse("nowhere.com", &config)),
        Some(ErrorKind::DomainUnknown)
    );
    assert_eq!(
        kind(&Host::parse("null-mx.com", &config)),
        Some(ErrorKind::DomainUnknown)
    );
}

#[test]
fn mx_validation_ignores_answers_seeded_without_dns() {
    let cache = Arc::new(ExchangerCache::new(8));
    let offline = Config::default()
        .with_dns_lookup(crate::config::DnsLookup::Off)
        .with_exchanger_cache(Arc::clone(&cache));
    let seeded = Host::parse("nowhere.test", &offline);
    assert_eq!(seeded.exchanger().lookup(), &crate::exchanger::MxLookup::Disabled);
    assert!(seeded.is_valid());

    let config = Config::default()
        .with_resolver(Arc::new(StaticResolver::new()))
        .with_exchanger_cache(cache);
    assert_eq!(
        kind(&Host::parse("nowhere.test", &config)),
        Some(ErrorKind::DomainUnknown)
    );
}

#[test]
fn a_record_validation() {
    let resolver = StaticResolver::new().with_ip("web-only.com", ip(192, 0, 2, 20));
    let config = online(resolver).with_host_validation(HostValidation::A);
    assert!(Host::parse("web-only.com", &config).is_valid());
    assert_eq!(
        kind(&Host::parse("nowhere.com", &config)),
        Some(ErrorKind::DomainUnknown)
    );
}

#[test]
fn dns_outage_policy() {
    let resolver = StaticResolver::new().with_outage("example.com");
    let closed = online(resolver.clone());
    let err = Host::parse("example.com", &closed).error().expect("outage");
    assert_eq!(err.kind, ErrorKind::DnsUnavailable);
    assert!(err.reason.is_some());

    let open = online(resolver).with_dns_fail_open(true);
    assert!(Host::parse("example.com", &open).is_valid());
}

#[test]
fn provider_inferred_from_exchangers_marks_hosted_service() {
    let resolver = StaticResolver::new()
        .with_mx("example-hosted.com", 10, "aspmx.l.google.com")
        .with_ip("aspmx.l.google.com", ip(142, 250, 0, 27));
    let config = online(resolver);

    let hosted = Host::parse("example-hosted.com", &config);
    assert_eq!(hosted.provider(), "google");
    assert!(hosted.is_hosted_service());
    assert_eq!(hosted.config().local_private_size, Some(1..=64));

    let gmail = Host::parse("gmail.com", &Config::offline());
    assert_eq!(gmail.provider(), "google");
    assert!(!gmail.is_hosted_service());
    assert_eq!(gmail.config().local_size, 3..=64);
}

#[test]
fn txt_and_dmarc_records() {
    let resolver = StaticResolver::new()
        .with_txt("example.com", "v=spf1 -all")
        .with_txt("_dmarc.example.com", "v=DMARC1; p=reject");
    let config = Config::offline().with_resolver(Arc::new(resolver));
    let host = Host::parse("example.com", &config);

    assert_eq!(host.txt(None).expect("txt"), Some("v=spf1 -all".to_string()));
    assert_eq!(
        host.txt_hash(None).expect("txt").get("v").map(String::as_str),
        Some("spf1 -all")
    );
    let dmarc = host.dmarc().expect("dmarc").expect("record");
    assert_eq!(dmarc.policy(), Some(DmarcPolicy::Reject));
    assert_eq!(host.txt(Some("missing.example.com")).expect("txt"), None);
}

#[test]
fn parts_snapshot() {
    let parts = parse("mail.example.com").parts();
    assert_eq!(parts.subdomains.as_deref(), Some("mail"));
    assert_eq!(parts.registration_name.as_deref(), Some("example"));
    assert_eq!(parts.domain_name.as_deref(), Some("example.com"));
    assert_eq!(parts.ip_address, None);
}
