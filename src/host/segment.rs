//! TLD / registration-name segmentation.
//!
//! This is a length heuristic, not a Public Suffix List:
//!
//! 1. a final label of 3-10 word characters is the TLD (`example.com`);
//! 2. else a 1-3 character label plus a 2 character label is a two-label
//!    TLD (`example.co.uk`);
//! 3. else a final 2 character label is the TLD (`example.de`).
//!
//! A name without dots (`localhost`) is all subdomain: it has no
//! registration name, domain name or TLD. A dotted name that fits none of
//! the rules keeps the whole name as its registration and domain name.
//!
//! Known misclassifications are kept as-is: `abc.xyz.de` segments as
//! registration `abc` with TLD `xyz.de`, and `example.gov.scot` as
//! registration `gov` under `scot`.

use std::sync::LazyLock;

use regex::Regex;

static SINGLE_TLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+)\.([0-9A-Za-z_]{3,10})$").expect("static regex"));
static DOUBLE_TLD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+)\.([0-9A-Za-z_]{1,3}\.[0-9A-Za-z_]{2})$").expect("static regex")
});
static SHORT_TLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+)\.([0-9A-Za-z_]{2})$").expect("static regex"));

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segments {
    pub subdomains: Option<String>,
    pub registration_name: String,
    /// Final label only (`uk`).
    pub tld: Option<String>,
    /// One or two labels (`co.uk`).
    pub tld2: Option<String>,
    pub domain_name: String,
}

/// Splits `name`; names the heuristic cannot segment keep the whole name
/// as registration and domain name, with no TLD.
pub fn segment(name: &str) -> Segments {
    if name.is_empty() {
        return Segments::default();
    }
    if !name.contains('.') {
        return Segments {
            subdomains: Some(name.to_string()),
            ..Segments::default()
        };
    }

    let captures = SINGLE_TLD
        .captures(name)
        .or_else(|| DOUBLE_TLD.captures(name))
        .or_else(|| SHORT_TLD.captures(name));

    let Some(captures) = captures else {
        return Segments {
            registration_name: name.to_string(),
            domain_name: name.to_string(),
            ..Segments::default()
        };
    };

    let rest = &captures[1];
    let tld2 = captures[2].to_string();
    let tld = tld2.rsplit('.').next().unwrap_or(&tld2).to_string();
    let (subdomains, registration_name) = match rest.rsplit_once('.') {
        Some((sub, registration)) => (Some(sub.to_string()), registration.to_string()),
        None => (None, rest.to_string()),
    };

    Segments {
        domain_name: format!("{registration_name}.{tld2}"),
        subdomains,
        registration_name,
        tld: Some(tld),
        tld2: Some(tld2),
    }
}
