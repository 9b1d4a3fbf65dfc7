use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use mailaddr_lib::rewriter::{srs_decode_at, srs_encode_at};
use mailaddr_lib::{
    Address, Config, DigestKind, DnsLookup, DnsResolver, ErrorKind, Exchanger, ExchangerCache,
    Host, HostEncoding, ProviderRegistry, ProviderRule, StaticResolver,
};
use proptest::prelude::*;

fn offline(raw: &str) -> Address {
    Address::parse(raw, &Config::offline())
}

#[test]
fn tagged_address_normalizes_and_canonicalizes() {
    let address = offline("User+tag@Example.com");
    assert_eq!(address.normal(), "user+tag@example.com");
    assert_eq!(address.canonical(), "user@example.com");
}

#[test]
fn gmail_rules_strip_dots_and_tags() {
    assert_eq!(
        mailaddr_lib::canonical("first.last+tag@gmail.com", &Config::offline()),
        "firstlast@gmail.com"
    );
    assert_eq!(
        mailaddr_lib::canonical("First.Last+tag@gmail.com", &Config::offline()),
        mailaddr_lib::canonical("firstlast+other@gmail.com", &Config::offline())
    );
}

#[test]
fn empty_input_is_invalid() {
    let address = offline("");
    assert_eq!(address.normal(), "");
    assert_eq!(address.canonical(), "");
    assert!(!address.is_valid());
}

#[test]
fn ip_literal_forbidden_by_default() {
    let err = mailaddr_lib::error("user@[127.0.0.1]", &Config::default()).expect("invalid");
    assert_eq!(err.kind, ErrorKind::IpAddressForbidden);
    assert_eq!(err.kind.as_str(), "ip_address_forbidden");
}

#[test]
fn whole_address_glob_matches() {
    assert_eq!(
        mailaddr_lib::matches("user+tag@gmail.com", &["user*@gmail*"], &Config::offline()),
        Some("user*@gmail*".to_string())
    );
}

#[test]
fn punycode_round_trip() {
    let host = Host::parse("å.com", &Config::offline());
    assert_eq!(host.dns_name(), "xn--5ca.com");
    let unicode = Config::offline().with_host_encoding(HostEncoding::Unicode);
    assert_eq!(Host::parse("xn--5ca.com", &unicode).name(), "å.com");
}

#[test]
fn tld_segmentation() {
    let host = Host::parse("sub.example.co.uk", &Config::offline());
    assert_eq!(host.subdomains(), Some("sub"));
    assert_eq!(host.registration_name(), Some("example"));
    assert_eq!(host.tld(), Some("uk"));
    assert_eq!(host.tld2(), Some("co.uk"));

    let plain = Host::parse("example.com", &Config::offline());
    assert_eq!(plain.registration_name(), Some("example"));
    assert_eq!(plain.tld(), Some("com"));
    assert_eq!(plain.subdomains(), None);
}

#[test]
fn redaction_equivalence() {
    let config = Config::offline().with_secrets("app-secret", "app-secret");
    let plain = Address::parse("user@example.com", &config);
    let redacted = plain.redact(DigestKind::Sha1);
    let stored = Address::parse(&redacted, &config);
    assert!(plain.same_as(&stored));
    assert_eq!(stored.redact(DigestKind::Sha1), redacted);
}

#[test]
fn exchanger_cache_evicts_least_recently_used() {
    let resolver = ["a.com", "b.com", "c.com"]
        .into_iter()
        .fold(StaticResolver::new(), |resolver, host| {
            resolver.with_mx(host, 10, "mx.example.net")
        });
    let cache = Arc::new(ExchangerCache::new(2));
    let config = Config::default()
        .with_resolver(Arc::new(resolver))
        .with_exchanger_cache(Arc::clone(&cache));
    let lookup = |host: &str| Exchanger::new(host, &config).mx_hosts().len();

    lookup("a.com");
    lookup("b.com");
    lookup("a.com");
    lookup("c.com");

    assert!(cache.contains("a.com"));
    assert!(!cache.contains("b.com"));
    assert!(cache.contains("c.com"));
    assert_eq!(cache.len(), 2);
}

#[test]
fn shared_cache_respects_each_configuration() {
    let cache = Arc::new(ExchangerCache::new(4));
    let resolver: Arc<dyn DnsResolver> = Arc::new(
        StaticResolver::new()
            .with_mx("customer.example", 10, "mx.myesp.net")
            .with_ip("mx.myesp.net", IpAddr::V4(Ipv4Addr::new(192, 0, 2, 25))),
    );

    let offline = Config::default()
        .with_dns_lookup(DnsLookup::Off)
        .with_exchanger_cache(Arc::clone(&cache));
    assert!(Address::parse("user@nowhere.test", &offline).is_valid());
    let online = Config::default()
        .with_resolver(Arc::new(StaticResolver::new()))
        .with_exchanger_cache(Arc::clone(&cache));
    assert_eq!(
        Address::parse("user@nowhere.test", &online).error().map(|e| e.kind),
        Some(ErrorKind::DomainUnknown)
    );

    let builtin = Config::default()
        .with_resolver(Arc::clone(&resolver))
        .with_exchanger_cache(Arc::clone(&cache));
    assert_eq!(Address::parse("user@customer.example", &builtin).provider(), "default");
    let custom = builtin.clone().with_providers(
        ProviderRegistry::builtin()
            .with_provider(ProviderRule::new("myesp").with_exchanger_match(["myesp.net"])),
    );
    assert_eq!(Address::parse("user@customer.example", &custom).provider(), "myesp");
}

#[test]
fn cidr_rules_on_ip_literals() {
    let address = offline("user@[123.123.123.8]");
    assert_eq!(
        address.matches(&["123.123.123.0/24"]),
        Some("123.123.123.0/24".to_string())
    );
    assert_eq!(address.matches(&["127.0.0.0/8"]), None);
    assert_eq!(address.matches(&["::/0"]), None);
}

#[test]
fn mx_backed_validation_through_injected_resolver() {
    let resolver = StaticResolver::new()
        .with_mx("example-hosted.com", 10, "aspmx.l.google.com")
        .with_ip("aspmx.l.google.com", IpAddr::V4(Ipv4Addr::new(142, 250, 0, 27)));
    let config = Config::default()
        .with_resolver(Arc::new(resolver))
        .with_exchanger_cache(Arc::new(ExchangerCache::new(4)));

    let address = Address::parse("first.last@example-hosted.com", &config);
    assert_eq!(address.provider(), "google");
    assert_eq!(address.canonical(), "firstlast@example-hosted.com");
    assert!(address.is_valid());

    let unknown = Address::parse("user@nowhere.example", &config);
    assert_eq!(unknown.error().map(|e| e.kind), Some(ErrorKind::DomainUnknown));
}

#[test]
fn localized_messages() {
    let config = Config::offline().with_locale("fr");
    let err = mailaddr_lib::error("user@bad_host.com", &config).expect("invalid");
    assert_eq!(err.kind, ErrorKind::DomainInvalid);
    assert_eq!(err.message, "Nom de domaine invalide");
}

proptest! {
    #[test]
    fn normalization_is_idempotent(
        mailbox in "[A-Za-z0-9]{1,8}",
        tag in proptest::option::of("[a-z0-9]{1,5}"),
        domain in "[A-Za-z]{2,10}\\.(com|org|net)",
    ) {
        let raw = match tag {
            Some(tag) => format!("{mailbox}+{tag}@{domain}"),
            None => format!("{mailbox}@{domain}"),
        };
        let once = offline(&raw).normal();
        let twice = offline(&once).normal();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn canonical_ignores_tags(
        mailbox in "[a-z0-9]{1,8}",
        first in "[a-z0-9]{1,5}",
        second in "[a-z0-9]{1,5}",
    ) {
        let a = offline(&format!("{mailbox}+{first}@Example.com"));
        let b = offline(&format!("{mailbox}+{second}@example.com"));
        prop_assert_eq!(a.canonical(), b.canonical());
    }

    #[test]
    fn srs_round_trip(
        local in "[a-z0-9.]{1,12}",
        host in "[a-z]{2,10}\\.com",
        sending in "[a-z]{2,10}\\.net",
    ) {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let encoded = srs_encode_at(&local, &host, &sending, Some("secret"), now);
        let decoded = srs_decode_at(&encoded, Some("secret"), now).expect("srs shape");
        prop_assert_eq!(decoded.address, format!("{local}@{host}"));
        prop_assert!(decoded.issues.is_empty());
    }
}
