//! DMARC and generic `key=value;` TXT records.

use std::collections::BTreeMap;

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmarcPolicy {
    None,
    Quarantine,
    Reject,
}

impl DmarcPolicy {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "none" => Some(Self::None),
            "quarantine" => Some(Self::Quarantine),
            "reject" => Some(Self::Reject),
            _ => None,
        }
    }
}

/// The `_dmarc` TXT record of a domain, split into its tags.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmarcRecord {
    pub record: String,
    pub tags: BTreeMap<String, String>,
}

impl DmarcRecord {
    /// The first `v=DMARC1` record among `records`.
    pub fn select(records: &[String]) -> Option<Self> {
        records
            .iter()
            .map(|record| record.trim())
            .find(|trimmed| starts_with_ignore_ascii_case(trimmed, "v=dmarc1"))
            .map(Self::parse)
    }

    pub fn parse(record: &str) -> Self {
        Self {
            record: record.to_string(),
            tags: parse_tags(record),
        }
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(&key.to_ascii_lowercase()).map(String::as_str)
    }

    /// `p=`; `None` when missing or unknown.
    pub fn policy(&self) -> Option<DmarcPolicy> {
        self.tag("p").and_then(DmarcPolicy::parse)
    }

    /// `sp=`, falling back to `p=`.
    pub fn subdomain_policy(&self) -> Option<DmarcPolicy> {
        self.tag("sp")
            .and_then(DmarcPolicy::parse)
            .or_else(|| self.policy())
    }
}

fn starts_with_ignore_ascii_case(input: &str, prefix: &str) -> bool {
    input
        .get(..prefix.len())
        .map(|head| head.eq_ignore_ascii_case(prefix))
        .unwrap_or(false)
}

/// Splits `k=v; k2=v2` into a map with lowercased keys. Later duplicates win.
pub fn parse_tags(record: &str) -> BTreeMap<String, String> {
    let mut tags = BTreeMap::new();
    for part in record.split(';') {
        let trimmed = part.trim();
        if trimmed.is_empty() {
            continue;
        }
        let (key, value) = trimmed.split_once('=').unwrap_or((trimmed, ""));
        tags.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
    }
    tags
}
