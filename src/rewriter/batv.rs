//! BATV "simple private signature" (`prvs=KDDDSSSSSS=address`).
//!
//! * `K` selects one of ten rotating keys
//! * `DDD` is the expiry day (days since the epoch, low three digits)
//! * `SSSSSS` is the first six hex digits of SHA-1(`K` `DDD` address key)

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use sha1::{Digest, Sha1};

use super::{RewriteIssue, RewriteScheme, Rewritten, days_since_epoch, signing_key};

static PRVS_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^prvs=(\d)(\d{3})(\w{6})=(.+)$").expect("static regex"));

const DAY_WINDOW: i64 = 1000;

pub fn is_prvs(email: &str) -> bool {
    PRVS_FORMAT.is_match(email)
}

/// Signs `address` with key digit `key_id`, valid for `days` days.
pub fn prvs_encode(address: &str, key_id: char, key: Option<&str>, days: i64) -> String {
    prvs_encode_at(address, key_id, key, days, Utc::now())
}

pub fn prvs_encode_at(
    address: &str,
    key_id: char,
    key: Option<&str>,
    days: i64,
    now: DateTime<Utc>,
) -> String {
    let ddd = prvs_day(now, days);
    let signature = prvs_sign(key_id, &ddd, address, key);
    format!("prvs={key_id}{ddd}{signature}={address}")
}

/// Verifies with the key registered for the address's key digit. An
/// address is expired once its day lies more than `days` ahead of today
/// in the rolling 1000-day window.
pub fn prvs_decode(email: &str, keys: &BTreeMap<char, String>, days: i64) -> Option<Rewritten> {
    prvs_decode_at(email, keys, days, Utc::now())
}

pub fn prvs_decode_at(
    email: &str,
    keys: &BTreeMap<char, String>,
    days: i64,
    now: DateTime<Utc>,
) -> Option<Rewritten> {
    let caps = PRVS_FORMAT.captures(email)?;
    let key_id = caps[1].chars().next()?;
    let (ddd, signature, address) = (&caps[2], &caps[3], &caps[4]);

    let mut issues = Vec::new();
    let key = keys.get(&key_id).map(String::as_str);
    if prvs_sign(key_id, ddd, address, key) != signature.to_ascii_lowercase() {
        issues.push(RewriteIssue::Altered);
    }
    let expiry: i64 = ddd.parse().ok()?;
    let today = days_since_epoch(now).rem_euclid(DAY_WINDOW);
    if (expiry - today).rem_euclid(DAY_WINDOW) > days {
        issues.push(RewriteIssue::Expired);
    }
    Some(Rewritten {
        scheme: RewriteScheme::Prvs,
        original: email.to_string(),
        address: address.to_string(),
        issues,
    })
}

fn prvs_day(now: DateTime<Utc>, days: i64) -> String {
    format!("{:03}", (days_since_epoch(now) + days).rem_euclid(DAY_WINDOW))
}

fn prvs_sign(key_id: char, ddd: &str, address: &str, key: Option<&str>) -> String {
    let key = signing_key(key, address);
    let digest = Sha1::digest(format!("{key_id}{ddd}{address}{key}").as_bytes());
    let mut signature = hex::encode(digest);
    signature.truncate(6);
    signature
}
