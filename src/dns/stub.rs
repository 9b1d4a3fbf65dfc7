use std::collections::{HashMap, HashSet};
use std::net::IpAddr;

use super::{DnsError, DnsResolver, MxRecord};

/// In-memory resolver answering from fixed tables.
///
/// Unknown names resolve to empty answers. Names registered with
/// [`StaticResolver::with_outage`] fail every query as if the network were
/// down.
#[derive(Debug, Default, Clone)]
pub struct StaticResolver {
    mx: HashMap<String, Vec<MxRecord>>,
    ips: HashMap<String, Vec<IpAddr>>,
    txt: HashMap<String, Vec<String>>,
    outages: HashSet<String>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mx(mut self, name: &str, preference: u16, exchange: &str) -> Self {
        self.mx
            .entry(normalize_name(name))
            .or_default()
            .push(MxRecord::new(preference, normalize_name(exchange)));
        self
    }

    pub fn with_ip(mut self, name: &str, ip: IpAddr) -> Self {
        self.ips.entry(normalize_name(name)).or_default().push(ip);
        self
    }

    pub fn with_txt(mut self, name: &str, record: impl Into<String>) -> Self {
        self.txt
            .entry(normalize_name(name))
            .or_default()
            .push(record.into());
        self
    }

    pub fn with_outage(mut self, name: &str) -> Self {
        self.outages.insert(normalize_name(name));
        self
    }

    fn check_outage(&self, key: &str) -> Result<(), DnsError> {
        if self.outages.contains(key) {
            return Err(DnsError::unavailable(key, "request timed out"));
        }
        Ok(())
    }
}

impl DnsResolver for StaticResolver {
    fn lookup_mx(&self, name: &str) -> Result<Vec<MxRecord>, DnsError> {
        let key = normalize_name(name);
        self.check_outage(&key)?;
        Ok(self.mx.get(&key).cloned().unwrap_or_default())
    }

    fn lookup_ip(&self, name: &str) -> Result<Vec<IpAddr>, DnsError> {
        let key = normalize_name(name);
        self.check_outage(&key)?;
        Ok(self.ips.get(&key).cloned().unwrap_or_default())
    }

    fn lookup_txt(&self, name: &str) -> Result<Vec<String>, DnsError> {
        let key = normalize_name(name);
        self.check_outage(&key)?;
        Ok(self.txt.get(&key).cloned().unwrap_or_default())
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}
