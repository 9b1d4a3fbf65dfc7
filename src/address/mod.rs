//! The public façade: a parsed address with its derived forms.
//!
//! ```
//! use mailaddr_lib::{Address, Config};
//!
//! let address = Address::parse("First.Last+News@Gmail.com", &Config::offline());
//! assert_eq!(address.to_string(), "first.last+news@gmail.com");
//! assert_eq!(address.canonical(), "firstlast@gmail.com");
//! assert!(address.is_valid());
//! ```

mod digest;


use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{LazyLock, OnceLock};

use regex::Regex;
use tracing::debug;

use crate::config::Config;
use crate::error::{ErrorKind, ValidationError};
use crate::host::Host;
use crate::local::Local;
use crate::matcher;
use crate::rewriter::{self, Rewritten};
use crate::smtp;

pub use digest::DigestKind;

static LOCAL_AT_HOST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+)@(.+)$").expect("static regex"));
static ADDRESS_RULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r".+@.+").expect("static regex"));

/// Renderings usable as digest input.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressForm {
    Normal,
    Canonical,
    /// Mailbox without tag, at the host name.
    #[default]
    Base,
    Munged,
}

#[derive(Clone)]
pub struct Address {
    original: String,
    local: Local,
    host: Host,
    rewrite: Option<Rewritten>,
    validation: OnceLock<Result<(), ValidationError>>,
}

impl Address {
    /// Parses `raw` under `config`.
    ///
    /// The input is trimmed and, unless `skip_rewrite` is set, SRS and PRVS
    /// envelope addresses are decoded first. The host's provider is
    /// resolved here, which may query DNS.
    pub fn parse(raw: &str, config: &Config) -> Self {
        let trimmed = raw.trim();
        let rewrite = if config.skip_rewrite {
            None
        } else {
            rewriter::decode(trimmed, config)
        };
        if let Some(rewritten) = &rewrite {
            debug!(scheme = ?rewritten.scheme, issues = ?rewritten.issues, "rewritten address decoded");
        }
        let email = rewrite.as_ref().map_or(trimmed, |r| r.address.as_str());
        let (left, right) = split_local_host(email);

        let host = Host::parse(right, config);
        let local = Local::parse(left, host.config(), Some(&host));
        Self {
            original: raw.to_string(),
            local,
            host,
            rewrite,
            validation: OnceLock::new(),
        }
    }

    /// Parses with [`Config::default`], which validates hosts over DNS.
    pub fn new(raw: &str) -> Self {
        Self::parse(raw, &Config::default())
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn local(&self) -> &Local {
        &self.local
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    /// Effective configuration (provider overrides applied).
    pub fn config(&self) -> &Config {
        self.host.config()
    }

    /// Decoded SRS/PRVS envelope, when the input was one.
    pub fn rewrite(&self) -> Option<&Rewritten> {
        self.rewrite.as_ref()
    }

    /// The rewrite's signature or expiry problem as an error. Not part of
    /// [`Address::validate`].
    pub fn rewrite_error(&self) -> Option<ValidationError> {
        self.rewrite
            .as_ref()
            .and_then(Rewritten::error_kind)
            .map(|kind| ValidationError::new(kind, &self.config().locale))
    }

    /// Everything left of the `@`, rendered.
    pub fn left(&self) -> String {
        self.local.to_string()
    }

    pub fn mailbox(&self) -> &str {
        self.local.mailbox()
    }

    pub fn tag(&self) -> Option<&str> {
        self.local.tag()
    }

    pub fn comment(&self) -> Option<&str> {
        self.local.comment()
    }

    pub fn host_name(&self) -> &str {
        self.host.host_name()
    }

    pub fn provider(&self) -> &str {
        self.host.provider()
    }

    /// `local@host` in the configured renderings. Empty when the local
    /// part is; the bare local part when the host is.
    pub fn normal(&self) -> String {
        let local = self.local.to_string();
        let host = self.host.name();
        if local.is_empty() {
            String::new()
        } else if host.is_empty() {
            local
        } else {
            format!("{local}@{host}")
        }
    }

    /// Account-identity form used for deduplication.
    pub fn canonical(&self) -> String {
        let mut canonical = self.local.canonical();
        let host = self.host.canonical();
        if !host.trim().is_empty() {
            canonical.push('@');
            canonical.push_str(&host);
        }
        canonical
    }

    pub fn is_canonical(&self) -> bool {
        self.canonical() == self.normal()
    }

    pub fn base(&self) -> String {
        let host = match self.host.host_name() {
            "" => self.host.name(),
            name => name.to_string(),
        };
        format!("{}@{host}", self.local.mailbox())
    }

    /// `{hexdigest}@host`, the digest taken over the canonical form (with
    /// the matching secret for SHA-1 and SHA-256). An already redacted
    /// address is returned unchanged.
    pub fn redact(&self, kind: DigestKind) -> String {
        if self.is_redacted() {
            return self.normal();
        }
        let mut redacted = format!("{{{}}}", self.digest(kind, AddressForm::Canonical));
        let host = self.host.name();
        if !host.trim().is_empty() {
            redacted.push('@');
            redacted.push_str(&host);
        }
        redacted
    }

    pub fn is_redacted(&self) -> bool {
        self.local.is_redacted()
    }

    /// Digest kind of an already redacted address.
    fn redacted_kind(&self) -> Option<DigestKind> {
        if !self.is_redacted() {
            return None;
        }
        DigestKind::from_hex_len(self.local.local().len().saturating_sub(2))
    }

    /// `ma*****@do*****`.
    pub fn munge(&self) -> String {
        let local = self.local.munge();
        let host = self.host.munge();
        if host.is_empty() {
            local
        } else {
            format!("{local}@{host}")
        }
    }

    pub fn form(&self, form: AddressForm) -> String {
        match form {
            AddressForm::Normal => self.normal(),
            AddressForm::Canonical => self.canonical(),
            AddressForm::Base => self.base(),
            AddressForm::Munged => self.munge(),
        }
    }

    /// MD5 of `form`, for sharing an identity without the address itself.
    pub fn reference(&self, form: AddressForm) -> String {
        self.digest(DigestKind::Md5, form)
    }

    pub fn sha1(&self, form: AddressForm) -> String {
        self.digest(DigestKind::Sha1, form)
    }

    pub fn sha256(&self, form: AddressForm) -> String {
        self.digest(DigestKind::Sha256, form)
    }

    fn digest(&self, kind: DigestKind, form: AddressForm) -> String {
        let config = self.config();
        let secret = match kind {
            DigestKind::Md5 => "",
            DigestKind::Sha1 => config.sha1_secret.as_str(),
            DigestKind::Sha256 => config.sha256_secret.as_str(),
        };
        digest::hex_digest(kind, &self.form(form), secret)
    }

    /// Same account: equal canonical forms, or one side's SHA-1 redaction
    /// equal to the other's canonical form.
    pub fn same_as(&self, other: &Address) -> bool {
        let canonical = self.canonical();
        let other_canonical = other.canonical();
        canonical == other_canonical
            || other
                .redacted_kind()
                .is_some_and(|kind| self.redact(kind) == other_canonical)
            || self
                .redacted_kind()
                .is_some_and(|kind| canonical == other.redact(kind))
    }

    /// First matching rule: local-part rules, host rules, then whole
    /// address globs such as `root@*.com`.
    pub fn matches<S: AsRef<str>>(&self, rules: &[S]) -> Option<String> {
        if let Some(rule) = self.local.matches(rules) {
            return Some(rule);
        }
        if let Some(rule) = self.host.matches(rules) {
            return Some(rule);
        }
        let normal = self.normal();
        rules
            .iter()
            .map(AsRef::as_ref)
            .filter(|rule| ADDRESS_RULE.is_match(rule))
            .find(|rule| matcher::glob_matches(rule, &normal))
            .map(str::to_string)
    }

    /// Local part, host, overall size, then the address validator; the
    /// first failure wins. Memoized.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validation
            .get_or_init(|| self.run_validation())
            .clone()
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn error(&self) -> Option<ValidationError> {
        self.validate().err()
    }

    fn run_validation(&self) -> Result<(), ValidationError> {
        self.local.validate()?;
        self.host.validate()?;
        let config = self.config();
        let normal = self.normal();
        if !config.address_size.contains(&normal.chars().count()) {
            return Err(ValidationError::new(ErrorKind::ExceedsSize, &config.locale));
        }
        if let Some(validator) = &config.address_validator {
            if !validator.allows(&normal) {
                return Err(ValidationError::new(ErrorKind::NotAllowed, &config.locale));
            }
        }
        Ok(())
    }

    /// Asks the host's mail server whether it accepts this recipient.
    ///
    /// Servers commonly rate limit or block clients that do this; it is
    /// meant for diagnosing a single address.
    pub fn connect(&self) -> Result<(), ValidationError> {
        let config = self.config();
        smtp::probe(&self.host.smtp_targets(), config, Some(&self.normal()))
            .map(|_| ())
            .map_err(|err| {
                ValidationError::with_reason(ErrorKind::AddressUnknown, err.to_string(), &config.locale)
            })
    }

    /// This address with a different local part.
    pub fn with_local(&self, local: &str) -> Address {
        Address::parse(
            &format!("{local}@{}", self.host.name()),
            self.host.base_config(),
        )
    }

    /// This address at a different host.
    pub fn with_host(&self, host: &str) -> Address {
        Address::parse(
            &format!("{}@{host}", self.local.original()),
            self.host.base_config(),
        )
    }

    /// SRS form for forwarding through `sending_domain`, signed with
    /// `srs_secret`.
    pub fn srs(&self, sending_domain: &str) -> String {
        rewriter::srs_encode(
            &self.local.to_string(),
            self.host.host_name(),
            sending_domain,
            self.config().srs_secret.as_deref(),
        )
    }

    /// This address as a bounce address carrying `recipient`.
    pub fn verp(&self, recipient: &str, split: char) -> String {
        rewriter::verp_encode(&self.local.to_string(), self.host.host_name(), recipient, split)
    }

    /// BATV-PRVS form signed with the key registered for `key_id`.
    pub fn batv_prvs(&self, key_id: char) -> String {
        let config = self.config();
        rewriter::prvs_encode(
            &self.normal(),
            key_id,
            config.prvs_keys.get(&key_id).map(String::as_str),
            config.prvs_days,
        )
    }
}

/// Splits on the last `@` that leaves both sides non-empty; without one the
/// whole input is the local part.
fn split_local_host(email: &str) -> (&str, &str) {
    match LOCAL_AT_HOST.captures(email) {
        Some(caps) => match (caps.get(1), caps.get(2)) {
            (Some(local), Some(host)) => (local.as_str(), host.as_str()),
            _ => (email, ""),
        },
        None => (email, ""),
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normal())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Address")
            .field("original", &self.original)
            .field("normal", &self.normal())
            .field("local", &self.local)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

/// Equality, ordering and hashing use the normal form.
impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.normal() == other.normal()
    }
}

impl Eq for Address {}

impl PartialOrd for Address {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Address {
    fn cmp(&self, other: &Self) -> Ordering {
        self.normal().cmp(&other.normal())
    }
}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normal().hash(state);
    }
}
