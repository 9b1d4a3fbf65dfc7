//! Local-part (left of `@`) parser, validator and renderers.
//!
//! A [`Local`] is immutable: the `with_form` helper produces a fresh parse
//! of a transformed string rather than patching fields.

mod grammar;


use std::fmt;

use unicode_normalization::UnicodeNormalization;

use crate::config::{Config, LocalEncoding, LocalFormat, LocalParts};
use crate::error::{ErrorKind, ValidationError};
use crate::host::Host;

pub use grammar::is_redacted;
pub(crate) use grammar::split_comment;

/// RFC 5321 ceiling on the local part, independent of configuration.
pub const STANDARD_MAX_SIZE: usize = 64;

const BUSINESS_MAILBOXES: &[&str] = &["info", "marketing", "sales", "support"];
const NETWORK_MAILBOXES: &[&str] = &["abuse", "noc", "security"];
const SERVICE_MAILBOXES: &[&str] = &[
    "postmaster",
    "hostmaster",
    "usenet",
    "news",
    "webmaster",
    "www",
    "uucp",
    "ftp",
];
const SYSTEM_MAILBOXES: &[&str] = &["help", "mailer-daemon", "root"];
const ROLE_MAILBOXES: &[&str] = &["staff", "office", "orders", "billing", "careers", "jobs"];

/// Grammar the local part satisfies, strictest first.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalSyntax {
    Conventional,
    Relaxed,
    Standard,
    Redacted,
    Invalid,
}

/// Rendering (and re-parsing) target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalForm {
    Conventional,
    Canonical,
    Relaxed,
    Standard,
}

#[derive(Clone)]
pub struct Local {
    original: String,
    local: String,
    mailbox: String,
    tag: Option<String>,
    comment: Option<String>,
    syntax: LocalSyntax,
    hosted_service: bool,
    config: Config,
}

impl Local {
    /// Parses `raw` under `config`. When `host` belongs to a hosted
    /// (private-label) domain, `local_private_size` replaces `local_size`.
    pub fn parse(raw: &str, config: &Config, host: Option<&Host>) -> Self {
        let hosted_service = host.is_some_and(Host::is_hosted_service);
        Self::build(raw, config.clone(), hosted_service)
    }

    fn build(raw: &str, config: Config, hosted_service: bool) -> Self {
        let mut local: String = raw.nfc().collect();
        if config.local_downcase {
            local = local.to_lowercase();
        }

        let parts = match &config.local_parse {
            Some(parser) => parser.parse(&local),
            None => {
                if grammar::unquote(&local).is_none()
                    && config.local_fix
                    && config.local_format != LocalFormat::Standard
                {
                    local = local.replace(' ', "").replace(',', ".");
                }
                split_parts(&local, config.tag_separator)
            }
        };

        let mut parsed = Self {
            original: raw.to_string(),
            local,
            mailbox: parts.mailbox,
            tag: parts.tag,
            comment: parts.comment,
            syntax: LocalSyntax::Invalid,
            hosted_service,
            config,
        };
        parsed.syntax = parsed.detect_syntax();
        parsed
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    /// Case-folded raw local part (before comment and tag extraction).
    pub fn local(&self) -> &str {
        &self.local
    }

    pub fn mailbox(&self) -> &str {
        &self.mailbox
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn syntax(&self) -> LocalSyntax {
        self.syntax
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_ascii(&self) -> bool {
        self.local.is_ascii()
    }

    pub fn is_unicode(&self) -> bool {
        !self.is_ascii()
    }

    /// Whether the local part is a `{hexdigest}` stand-in. MD5 and SHA-256
    /// digests count here even though only the SHA-1 shape is the
    /// `Redacted` grammar level.
    pub fn is_redacted(&self) -> bool {
        grammar::is_redacted_digest(&self.local)
    }

    /// RFC 2142 role mailboxes plus common system and staff names.
    pub fn is_special(&self) -> bool {
        [
            BUSINESS_MAILBOXES,
            NETWORK_MAILBOXES,
            SERVICE_MAILBOXES,
            SYSTEM_MAILBOXES,
            ROLE_MAILBOXES,
        ]
        .iter()
        .any(|list| list.contains(&self.mailbox.as_str()))
    }

    /// Mailbox with trailing digits removed (`user123` -> `user`).
    pub fn root_name(&self) -> &str {
        grammar::strip_trailing_digits(&self.mailbox).unwrap_or(&self.mailbox)
    }

    pub fn format_as(&self, form: LocalForm) -> String {
        match form {
            LocalForm::Conventional => self.conventional(),
            LocalForm::Canonical => self.canonical(),
            LocalForm::Relaxed => self.relax(),
            LocalForm::Standard => self.standard(),
        }
    }

    /// Fresh parse of this local part rendered in `form`.
    pub fn with_form(&self, form: LocalForm) -> Local {
        Self::build(&self.format_as(form), self.config.clone(), self.hosted_service)
    }

    /// Mailbox and tag joined by the separator.
    pub fn conventional(&self) -> String {
        match (&self.tag, self.config.tag_separator) {
            (Some(tag), Some(separator)) => format!("{}{separator}{tag}", self.mailbox),
            _ => self.mailbox.clone(),
        }
    }

    /// Account-identity form: the provider's canonicalizer, else the
    /// lower-cased mailbox.
    pub fn canonical(&self) -> String {
        match &self.config.mailbox_canonical {
            Some(canonical) => canonical.canonicalize(&self.mailbox),
            None => self.mailbox.to_lowercase(),
        }
    }

    /// Conventional form with RFC specials removed.
    pub fn relax(&self) -> String {
        self.conventional()
            .chars()
            .filter(|c| !needs_quoting(*c))
            .collect()
    }

    /// RFC 5322 form: comment re-attached, `\` and `"` escaped, quoted when
    /// specials remain.
    pub fn standard(&self) -> String {
        let mut form = self.conventional();
        if let Some(comment) = &self.comment {
            form.push('(');
            form.push_str(comment);
            form.push(')');
        }
        let escaped = form.replace('\\', "\\\\").replace('"', "\\\"");
        if escaped.chars().any(needs_quoting) {
            format!("\"{escaped}\"")
        } else {
            escaped
        }
    }

    /// First one or two characters followed by the munge string.
    pub fn munge(&self) -> String {
        munge(&self.to_string(), &self.config.munge_string)
    }

    /// First rule of the form `glob@` whose glob matches the rendered local
    /// part.
    pub fn matches<S: AsRef<str>>(&self, rules: &[S]) -> Option<String> {
        let rendered = self.to_string();
        rules
            .iter()
            .map(AsRef::as_ref)
            .find(|rule| match rule.strip_suffix('@') {
                Some(pattern) if !pattern.is_empty() => {
                    crate::matcher::glob_matches(pattern, &rendered)
                }
                _ => false,
            })
            .map(str::to_string)
    }

    /// Checks sizes, encoding and the configured format (or the configured
    /// mailbox validator, which replaces the grammar check).
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.check_size()?;
        self.check_encoding()?;
        let grammar_ok = match &self.config.mailbox_validator {
            Some(validator) => validator.is_valid(&self.mailbox, self.tag.as_deref()),
            None => self.matches_grammar(self.config.local_format),
        };
        if grammar_ok {
            Ok(())
        } else {
            Err(self.error_of(ErrorKind::InvalidMailbox))
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn error(&self) -> Option<ValidationError> {
        self.validate().err()
    }

    /// Whether the local part passes `format` (sizes and encoding included).
    pub fn conforms_to(&self, format: LocalFormat) -> bool {
        self.check_size().is_ok() && self.check_encoding().is_ok() && self.matches_grammar(format)
    }

    fn detect_syntax(&self) -> LocalSyntax {
        if self.conforms_to(LocalFormat::Conventional) {
            LocalSyntax::Conventional
        } else if self.conforms_to(LocalFormat::Relaxed) {
            LocalSyntax::Relaxed
        } else if self.conforms_to(LocalFormat::Redacted) {
            LocalSyntax::Redacted
        } else if self.conforms_to(LocalFormat::Standard) {
            LocalSyntax::Standard
        } else {
            LocalSyntax::Invalid
        }
    }

    fn matches_grammar(&self, format: LocalFormat) -> bool {
        match format {
            LocalFormat::Conventional => match &self.tag {
                Some(tag) => {
                    grammar::is_conventional_mailbox(&self.mailbox)
                        && grammar::is_conventional_tag(tag)
                }
                None => grammar::is_conventional_mailbox(&self.local),
            },
            LocalFormat::Relaxed => match &self.tag {
                Some(tag) => {
                    grammar::is_relaxed_mailbox(&self.mailbox) && grammar::is_relaxed_tag(tag)
                }
                None => grammar::is_relaxed_mailbox(&self.local),
            },
            LocalFormat::Standard => grammar::is_standard(&self.local),
            LocalFormat::Redacted => grammar::is_redacted(&self.local),
            LocalFormat::Unchecked => true,
        }
    }

    fn check_size(&self) -> Result<(), ValidationError> {
        let local_len = self.local.chars().count();
        if local_len > STANDARD_MAX_SIZE {
            return Err(self.error_of(ErrorKind::LocalSizeLong));
        }
        let local_range = if self.hosted_service {
            self.config.local_private_size.as_ref()
        } else {
            Some(&self.config.local_size)
        };
        if let Some(range) = local_range {
            self.check_range(local_len, range)?;
        }
        self.check_range(self.mailbox.chars().count(), &self.config.mailbox_size)
    }

    fn check_range(
        &self,
        len: usize,
        range: &std::ops::RangeInclusive<usize>,
    ) -> Result<(), ValidationError> {
        if len < *range.start() {
            Err(self.error_of(ErrorKind::LocalSizeShort))
        } else if len > *range.end() {
            Err(self.error_of(ErrorKind::LocalSizeLong))
        } else {
            Ok(())
        }
    }

    fn check_encoding(&self) -> Result<(), ValidationError> {
        if self.config.local_encoding == LocalEncoding::Ascii && self.is_unicode() {
            return Err(ValidationError::with_reason(
                ErrorKind::InvalidMailbox,
                "non-ASCII characters",
                &self.config.locale,
            ));
        }
        Ok(())
    }

    fn error_of(&self, kind: ErrorKind) -> ValidationError {
        ValidationError::new(kind, &self.config.locale)
    }
}

/// Rendered in the configured local format.
impl fmt::Display for Local {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = match self.config.local_format {
            LocalFormat::Relaxed => self.relax(),
            LocalFormat::Standard => self.standard(),
            LocalFormat::Conventional | LocalFormat::Redacted | LocalFormat::Unchecked => {
                self.conventional()
            }
        };
        f.write_str(&rendered)
    }
}

impl fmt::Debug for Local {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Local")
            .field("local", &self.local)
            .field("mailbox", &self.mailbox)
            .field("tag", &self.tag)
            .field("comment", &self.comment)
            .field("syntax", &self.syntax)
            .finish()
    }
}

fn split_parts(local: &str, separator: Option<char>) -> LocalParts {
    let unquoted = grammar::unquote(local);
    let token = unquoted.as_deref().unwrap_or(local);
    let (rest, comment) = grammar::split_comment(token);
    let (mailbox, tag) = match separator.and_then(|sep| rest.split_once(sep)) {
        Some((mailbox, tag)) => (mailbox.to_string(), Some(tag.to_string())),
        None => (rest, None),
    };
    LocalParts {
        mailbox,
        tag,
        comment,
    }
}

// Characters that force quoting in the standard form.
fn needs_quoting(c: char) -> bool {
    matches!(
        c,
        ' ' | '"' | '(' | ')' | ',' | ':' | '<' | '>' | '@' | '[' | ']' | '\\'
    )
}

pub(crate) fn munge(value: &str, munge_string: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    let head: String = value.chars().take(2).collect();
    format!("{head}{munge_string}")
}
