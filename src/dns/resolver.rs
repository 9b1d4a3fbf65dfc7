use std::net::IpAddr;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;
use trust_dns_resolver::{
    Resolver,
    error::{ResolveError, ResolveErrorKind},
    lookup::TxtLookup,
    system_conf::read_system_conf,
};

use super::{DnsError, DnsResolver, MxRecord};

static SHARED: LazyLock<Arc<SystemResolver>> =
    LazyLock::new(|| Arc::new(SystemResolver::new(None)));

/// Blocking resolver built from the host's system configuration.
///
/// The underlying `trust-dns` resolver is created on first use and reused.
/// Queries are attempted once; a timeout surfaces as [`DnsError`].
pub struct SystemResolver {
    timeout: Option<Duration>,
    inner: Mutex<Option<Arc<Resolver>>>,
}

impl SystemResolver {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            inner: Mutex::new(None),
        }
    }

    /// Process-wide instance with the resolver's default timeout.
    pub fn shared() -> Arc<Self> {
        Arc::clone(&SHARED)
    }

    fn resolver(&self) -> Result<Arc<Resolver>, DnsError> {
        let mut guard = self.inner.lock();
        if let Some(resolver) = guard.as_ref() {
            return Ok(Arc::clone(resolver));
        }
        let (config, mut opts) = read_system_conf().map_err(DnsError::resolver_init)?;
        if let Some(timeout) = self.timeout {
            opts.timeout = timeout;
        }
        opts.attempts = 1;
        let resolver = Arc::new(Resolver::new(config, opts).map_err(DnsError::resolver_init)?);
        *guard = Some(Arc::clone(&resolver));
        Ok(resolver)
    }
}

impl std::fmt::Debug for SystemResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemResolver")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl DnsResolver for SystemResolver {
    fn lookup_mx(&self, name: &str) -> Result<Vec<MxRecord>, DnsError> {
        let resolver = self.resolver()?;
        let lookup = match resolver.mx_lookup(name) {
            Ok(lookup) => lookup,
            Err(err) if should_treat_as_empty(&err) => return Ok(Vec::new()),
            Err(err) => return Err(DnsError::lookup("MX", name, err)),
        };
        let mut records = Vec::new();
        for mx in lookup.iter() {
            let exchange = normalize_exchange(mx.exchange().to_utf8());
            records.push(MxRecord::new(mx.preference(), exchange));
        }
        debug!(name, count = records.len(), "mx lookup");
        Ok(records)
    }

    fn lookup_ip(&self, name: &str) -> Result<Vec<IpAddr>, DnsError> {
        let resolver = self.resolver()?;
        match resolver.lookup_ip(name) {
            Ok(lookup) => Ok(lookup.iter().collect()),
            Err(err) if should_treat_as_empty(&err) => Ok(Vec::new()),
            Err(err) => Err(DnsError::lookup("A/AAAA", name, err)),
        }
    }

    fn lookup_txt(&self, name: &str) -> Result<Vec<String>, DnsError> {
        let resolver = self.resolver()?;
        let lookup = match resolver.txt_lookup(name) {
            Ok(lookup) => lookup,
            Err(err) if should_treat_as_empty(&err) => return Ok(Vec::new()),
            Err(err) => return Err(DnsError::lookup("TXT", name, err)),
        };
        collect_txt_records(name, &lookup)
    }
}

fn collect_txt_records(name: &str, lookup: &TxtLookup) -> Result<Vec<String>, DnsError> {
    let mut records = Vec::new();
    for txt in lookup.iter() {
        let mut record = String::new();
        for piece in txt.txt_data().iter() {
            let segment = std::str::from_utf8(piece.as_ref())
                .map_err(|err| DnsError::txt_data_utf8(name, err))?;
            record.push_str(segment);
        }
        records.push(record);
    }
    Ok(records)
}

// NXDOMAIN and empty answers both land here.
fn should_treat_as_empty(err: &ResolveError) -> bool {
    matches!(err.kind(), ResolveErrorKind::NoRecordsFound { .. })
}

pub(crate) fn normalize_exchange(exchange: String) -> String {
    let trimmed = exchange.trim_end_matches('.');
    trimmed.to_ascii_lowercase()
}
