//! Envelope address rewriting: SRS, VERP and BATV-PRVS.
//!
//! SRS (Sender Rewriting Scheme) lets a forwarder send with its own domain
//! while keeping the original sender recoverable:
//!
//! ```text
//! SRS0=HHHH=TT=original-host=original-local@forwarding-domain
//! ```
//!
//! `TT` is a two-character day token on a 210-day cycle and `HHHH` a
//! truncated keyed SHA-1 of everything after it. VERP embeds a recipient in
//! a bounce address and carries no signature.

mod batv;

#[cfg(test)]
mod tests;

use std::sync::LazyLock;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use regex::Regex;
use sha1::{Digest, Sha1};
use tracing::warn;

use crate::config::Config;
use crate::error::ErrorKind;

pub use batv::{is_prvs, prvs_decode, prvs_decode_at, prvs_encode, prvs_encode_at};

static SRS_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^SRS0=(....)=(\w\w)=(.+?)=(.+?)@(.+)$").expect("static regex")
});

const SECONDS_PER_DAY: i64 = 86_400;
const SRS_TT_CYCLE: i64 = 210;

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteScheme {
    Srs,
    Prvs,
}

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteIssue {
    /// The signature does not match the rest of the address.
    Altered,
    /// The time token is no longer current.
    Expired,
}

impl RewriteIssue {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Altered => ErrorKind::SrsAltered,
            Self::Expired => ErrorKind::SrsExpired,
        }
    }
}

/// A decoded rewritten address. `address` is reconstructed even when
/// `issues` is not empty.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    pub scheme: RewriteScheme,
    pub original: String,
    pub address: String,
    pub issues: Vec<RewriteIssue>,
}

impl Rewritten {
    pub fn is_verified(&self) -> bool {
        self.issues.is_empty()
    }

    /// First issue as a validation error kind.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.issues.first().map(RewriteIssue::kind)
    }
}

/// A decoded VERP address.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verp {
    /// The bounce address without the embedded recipient.
    pub bounce: String,
    pub recipient: String,
}

/// Decodes an SRS or PRVS address with the secrets from `config`; `None`
/// when `email` is neither.
pub fn decode(email: &str, config: &Config) -> Option<Rewritten> {
    decode_at(email, config, Utc::now())
}

pub fn decode_at(email: &str, config: &Config, now: DateTime<Utc>) -> Option<Rewritten> {
    srs_decode_at(email, config.srs_secret.as_deref(), now)
        .or_else(|| prvs_decode_at(email, &config.prvs_keys, config.prvs_days, now))
}

pub fn is_srs(email: &str) -> bool {
    SRS_FORMAT.is_match(email)
}

/// `SRS0=HHHH=TT=host=local@sending_domain`.
pub fn srs_encode(local: &str, host: &str, sending_domain: &str, key: Option<&str>) -> String {
    srs_encode_at(local, host, sending_domain, key, Utc::now())
}

pub fn srs_encode_at(
    local: &str,
    host: &str,
    sending_domain: &str,
    key: Option<&str>,
    now: DateTime<Utc>,
) -> String {
    let inner = format!("{}={host}={local}@{sending_domain}", srs_tt(now));
    format!("SRS0={}={inner}", srs_hash(&inner, key))
}

pub fn srs_decode(email: &str, key: Option<&str>) -> Option<Rewritten> {
    srs_decode_at(email, key, Utc::now())
}

pub fn srs_decode_at(email: &str, key: Option<&str>, now: DateTime<Utc>) -> Option<Rewritten> {
    let caps = SRS_FORMAT.captures(email)?;
    let (hash, tt, domain, local, sending_domain) = (&caps[1], &caps[2], &caps[3], &caps[4], &caps[5]);

    let inner = format!("{tt}={domain}={local}@{sending_domain}");
    let mut issues = Vec::new();
    if srs_hash(&inner, key) != hash {
        issues.push(RewriteIssue::Altered);
    }
    if tt != srs_tt(now) {
        issues.push(RewriteIssue::Expired);
    }
    Some(Rewritten {
        scheme: RewriteScheme::Srs,
        original: email.to_string(),
        address: format!("{local}@{domain}"),
        issues,
    })
}

/// Two-character day token: the first two base64 characters of the day
/// number modulo 210.
pub fn srs_tt(now: DateTime<Utc>) -> String {
    let day = days_since_epoch(now).rem_euclid(SRS_TT_CYCLE);
    STANDARD.encode(day.to_string()).chars().take(2).collect()
}

fn srs_hash(inner: &str, key: Option<&str>) -> String {
    let key = signing_key(key, inner);
    let digest = Sha1::digest(format!("{inner}{key}").as_bytes());
    STANDARD.encode(digest).chars().take(4).collect()
}

/// The caller's key, or the reversed `subject` when none is configured.
pub(crate) fn signing_key(key: Option<&str>, subject: &str) -> String {
    match key {
        Some(key) if !key.is_empty() => key.to_string(),
        _ => {
            warn!("no rewrite secret configured, signing with a weak derived key");
            subject.chars().rev().collect()
        }
    }
}

pub(crate) fn days_since_epoch(now: DateTime<Utc>) -> i64 {
    now.timestamp().div_euclid(SECONDS_PER_DAY)
}

/// `local` + `split` + recipient (with `@` as `=`) + `@` + `host`.
pub fn verp_encode(local: &str, host: &str, recipient: &str, split: char) -> String {
    format!("{local}{split}{}@{host}", recipient.replace('@', "="))
}

/// Splits `local+recipient=example.org@host` back into the bounce address
/// and the recipient. The last `=` of the embedded part becomes the `@`.
pub fn verp_decode(address: &str, split: char) -> Option<Verp> {
    let (local, host) = address.rsplit_once('@')?;
    let (bounce_local, embedded) = local.split_once(split)?;
    let (recipient_local, recipient_host) = embedded.rsplit_once('=')?;
    Some(Verp {
        bounce: format!("{bounce_local}@{host}"),
        recipient: format!("{recipient_local}@{recipient_host}"),
    })
}
