use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

use super::strategy::{MailboxCanonicalizer, MailboxValidator, MsnMailbox, StripDots};
use super::LocalFormat;

pub const DEFAULT_PROVIDER: &str = "default";

/// Overrides a mail provider applies on top of the caller's configuration.
///
/// Every field is optional; unset fields fall back to the registry's
/// `default` rule and then to the caller's [`Config`](super::Config).
#[derive(Clone, Default)]
pub struct ProviderRule {
    pub name: String,
    pub host_match: Vec<String>,
    pub exchanger_match: Vec<String>,
    pub local_size: Option<RangeInclusive<usize>>,
    pub local_private_size: Option<RangeInclusive<usize>>,
    pub mailbox_size: Option<RangeInclusive<usize>>,
    pub tag_separator: Option<char>,
    pub local_format: Option<LocalFormat>,
    pub mailbox_canonical: Option<Arc<dyn MailboxCanonicalizer>>,
    pub mailbox_validator: Option<Arc<dyn MailboxValidator>>,
}

impl ProviderRule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_host_match<I, S>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.host_match = rules.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_exchanger_match<I, S>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exchanger_match = rules.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_local_size(mut self, size: RangeInclusive<usize>) -> Self {
        self.local_size = Some(size);
        self
    }

    pub fn with_local_private_size(mut self, size: RangeInclusive<usize>) -> Self {
        self.local_private_size = Some(size);
        self
    }

    pub fn with_mailbox_size(mut self, size: RangeInclusive<usize>) -> Self {
        self.mailbox_size = Some(size);
        self
    }

    pub fn with_tag_separator(mut self, separator: char) -> Self {
        self.tag_separator = Some(separator);
        self
    }

    pub fn with_local_format(mut self, format: LocalFormat) -> Self {
        self.local_format = Some(format);
        self
    }

    pub fn with_mailbox_canonical(mut self, canonical: impl MailboxCanonicalizer + 'static) -> Self {
        self.mailbox_canonical = Some(Arc::new(canonical));
        self
    }

    pub fn with_mailbox_validator(mut self, validator: impl MailboxValidator + 'static) -> Self {
        self.mailbox_validator = Some(Arc::new(validator));
        self
    }

    pub fn is_default(&self) -> bool {
        self.name == DEFAULT_PROVIDER
    }

    /// Fills every unset field of `self` from `fallback`; the name and match
    /// lists of `self` are kept.
    pub fn merged_over(&self, fallback: &ProviderRule) -> ProviderRule {
        ProviderRule {
            name: self.name.clone(),
            host_match: self.host_match.clone(),
            exchanger_match: self.exchanger_match.clone(),
            local_size: self.local_size.clone().or_else(|| fallback.local_size.clone()),
            local_private_size: self
                .local_private_size
                .clone()
                .or_else(|| fallback.local_private_size.clone()),
            mailbox_size: self
                .mailbox_size
                .clone()
                .or_else(|| fallback.mailbox_size.clone()),
            tag_separator: self.tag_separator.or(fallback.tag_separator),
            local_format: self.local_format.or(fallback.local_format),
            mailbox_canonical: self
                .mailbox_canonical
                .clone()
                .or_else(|| fallback.mailbox_canonical.clone()),
            mailbox_validator: self
                .mailbox_validator
                .clone()
                .or_else(|| fallback.mailbox_validator.clone()),
        }
    }
}

impl fmt::Debug for ProviderRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRule")
            .field("name", &self.name)
            .field("host_match", &self.host_match)
            .field("exchanger_match", &self.exchanger_match)
            .field("local_size", &self.local_size)
            .field("local_private_size", &self.local_private_size)
            .field("mailbox_size", &self.mailbox_size)
            .field("tag_separator", &self.tag_separator)
            .field("local_format", &self.local_format)
            .field("mailbox_canonical", &self.mailbox_canonical.is_some())
            .field("mailbox_validator", &self.mailbox_validator.is_some())
            .finish()
    }
}

/// Read-only, ordered table of provider rules. Lookups are first-match in
/// insertion order.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    default: ProviderRule,
    rules: Vec<ProviderRule>,
}

impl ProviderRegistry {
    /// Registry with a blank `default` rule and no named providers.
    pub fn empty() -> Self {
        Self {
            default: ProviderRule::new(DEFAULT_PROVIDER),
            rules: Vec::new(),
        }
    }

    /// The shipped table: `aol`, `google`, `msn`, `yahoo`.
    pub fn builtin() -> Self {
        Self::empty()
            .with_provider(
                ProviderRule::new("aol")
                    .with_host_match(["aol.", "compuserve.", "netscape.", "aim.", "cs."]),
            )
            .with_provider(
                ProviderRule::new("google")
                    .with_host_match(["gmail.com", "googlemail.com"])
                    .with_exchanger_match(["google.com", "googlemail.com"])
                    .with_local_size(3..=64)
                    .with_local_private_size(1..=64)
                    .with_mailbox_canonical(StripDots),
            )
            .with_provider(
                ProviderRule::new("msn")
                    .with_host_match(["msn.", "hotmail.", "outlook.", "live."])
                    .with_exchanger_match(["outlook.com"])
                    .with_mailbox_validator(MsnMailbox),
            )
            .with_provider(
                ProviderRule::new("yahoo")
                    .with_host_match(["yahoo.", "ymail.", "rocketmail."])
                    .with_exchanger_match(["yahoodns", "yahoo-inc"]),
            )
    }

    /// Adds `rule`, replacing an existing rule of the same name in place.
    /// A rule named `default` replaces the fallback entry.
    pub fn with_provider(mut self, rule: ProviderRule) -> Self {
        if rule.is_default() {
            self.default = rule;
        } else if let Some(slot) = self.rules.iter_mut().find(|r| r.name == rule.name) {
            *slot = rule;
        } else {
            self.rules.push(rule);
        }
        self
    }

    pub fn default_rule(&self) -> &ProviderRule {
        &self.default
    }

    /// Named rules in lookup order (the default entry excluded).
    pub fn rules(&self) -> impl Iterator<Item = &ProviderRule> {
        self.rules.iter()
    }

    /// Effective rule for `name`: the named entry merged over `default`.
    pub fn get(&self, name: &str) -> Option<ProviderRule> {
        if name == DEFAULT_PROVIDER {
            return Some(self.default.clone());
        }
        self.rules
            .iter()
            .find(|rule| rule.name == name)
            .map(|rule| rule.merged_over(&self.default))
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
