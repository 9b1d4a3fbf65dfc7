use std::collections::BTreeMap;

use chrono::{DateTime, Duration, TimeZone, Utc};

use super::*;

fn new_year() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
}

#[test]
fn srs_time_token() {
    assert_eq!(srs_tt(new_year()), "MT");
    assert_eq!(srs_tt(new_year() + Duration::days(22)), "NQ");
}

#[test]
fn srs_encodes_known_vector() {
    let encoded = srs_encode_at("user", "example.com", "forwarder.net", Some("secret"), new_year());
    assert_eq!(encoded, "SRS0=14dI=MT=example.com=user@forwarder.net");
    assert!(is_srs(&encoded));
    assert!(!is_srs("user@example.com"));
}

#[test]
fn srs_round_trip() {
    let encoded = srs_encode_at("user", "example.com", "forwarder.net", Some("secret"), new_year());
    let decoded = srs_decode_at(&encoded, Some("secret"), new_year()).expect("srs");
    assert_eq!(decoded.scheme, RewriteScheme::Srs);
    assert_eq!(decoded.address, "user@example.com");
    assert!(decoded.is_verified());
    assert_eq!(decoded.error_kind(), None);
}

#[test]
fn srs_reports_tampering_and_age() {
    let tampered = "SRS0=AAAA=MT=example.com=user@forwarder.net";
    let decoded = srs_decode_at(tampered, Some("secret"), new_year()).expect("srs");
    assert_eq!(decoded.issues, vec![RewriteIssue::Altered]);
    assert_eq!(decoded.address, "user@example.com");
    assert_eq!(decoded.error_kind(), Some(ErrorKind::SrsAltered));

    let encoded = srs_encode_at("user", "example.com", "forwarder.net", Some("secret"), new_year());
    let later = new_year() + Duration::days(22);
    let stale = srs_decode_at(&encoded, Some("secret"), later).expect("srs");
    assert_eq!(stale.issues, vec![RewriteIssue::Expired]);
    assert_eq!(stale.error_kind(), Some(ErrorKind::SrsExpired));

    let wrong_key = srs_decode_at(&encoded, Some("other"), new_year()).expect("srs");
    assert_eq!(wrong_key.issues, vec![RewriteIssue::Altered]);
}

#[test]
fn srs_without_key_still_round_trips() {
    let encoded = srs_encode_at("user", "example.com", "forwarder.net", None, new_year());
    let decoded = srs_decode_at(&encoded, None, new_year()).expect("srs");
    assert!(decoded.is_verified());
}

#[test]
fn prvs_encodes_known_vector() {
    let encoded = prvs_encode_at("user@example.com", '0', Some("batv-key"), 30, new_year());
    assert_eq!(encoded, "prvs=07530122ed=user@example.com");
    assert!(is_prvs(&encoded));
}

#[test]
fn prvs_verification_and_expiry() {
    let keys = BTreeMap::from([('0', "batv-key".to_string())]);
    let encoded = prvs_encode_at("user@example.com", '0', Some("batv-key"), 30, new_year());

    let fresh = prvs_decode_at(&encoded, &keys, 30, new_year()).expect("prvs");
    assert_eq!(fresh.scheme, RewriteScheme::Prvs);
    assert_eq!(fresh.address, "user@example.com");
    assert!(fresh.is_verified());

    let last_day = prvs_decode_at(&encoded, &keys, 30, new_year() + Duration::days(30)).expect("prvs");
    assert!(last_day.is_verified());

    let expired = prvs_decode_at(&encoded, &keys, 30, new_year() + Duration::days(31)).expect("prvs");
    assert_eq!(expired.issues, vec![RewriteIssue::Expired]);

    let tampered = encoded.replace("0122ed", "0122ee");
    let altered = prvs_decode_at(&tampered, &keys, 30, new_year()).expect("prvs");
    assert_eq!(altered.issues, vec![RewriteIssue::Altered]);
}

#[test]
fn decode_dispatches_on_scheme() {
    let config = Config::default()
        .with_srs_secret("secret")
        .with_prvs_key('0', "batv-key");
    let srs = decode_at("SRS0=14dI=MT=example.com=user@forwarder.net", &config, new_year())
        .expect("srs");
    assert_eq!(srs.scheme, RewriteScheme::Srs);
    assert!(srs.is_verified());

    let prvs = decode_at("prvs=07530122ed=user@example.com", &config, new_year()).expect("prvs");
    assert_eq!(prvs.scheme, RewriteScheme::Prvs);
    assert!(prvs.is_verified());

    assert!(decode_at("user@example.com", &config, new_year()).is_none());
}

#[test]
fn verp_round_trip() {
    let encoded = verp_encode("message-id", "example.net", "recipient@example.org", '+');
    assert_eq!(encoded, "message-id+recipient=example.org@example.net");

    let decoded = verp_decode(&encoded, '+').expect("verp");
    assert_eq!(decoded.bounce, "message-id@example.net");
    assert_eq!(decoded.recipient, "recipient@example.org");

    assert!(verp_decode("plain@example.net", '+').is_none());
}
