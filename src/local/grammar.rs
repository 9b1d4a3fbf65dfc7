use std::sync::LazyLock;

use regex::Regex;

// word = Unicode letters and digits; `_` is punctuation
static CONVENTIONAL_MAILBOX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\p{L}\p{N}]+(?:[.\-+'_][\p{L}\p{N}]+)*$").expect("static regex")
});

static RELAXED_MAILBOX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\p{L}\p{N}]+(?:[.\-+'_]+[\p{L}\p{N}]+)*$").expect("static regex")
});

const ATEXT: &str = r"[\p{L}\p{N}!#$%&'*+\-/=?^_`{|}~()]+";
const QUOTED: &str =
    r#""(?:\\["\\ ]|[\x20-\x21\x23-\x2F\x3A-\x40\x5B\x5D-\x60\x7B-\x7E\p{L}\p{N}])+""#;

static STANDARD_LOCAL: LazyLock<Regex> = LazyLock::new(|| {
    let token = format!("(?:{ATEXT}|{QUOTED})");
    Regex::new(&format!(r"^{token}(?:\.{token})*$")).expect("static regex")
});

static REDACTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{[0-9a-f]{40}\}$").expect("static regex"));

// md5, sha1 or sha256
static REDACTED_DIGEST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\{(?:[0-9a-f]{32}|[0-9a-f]{40}|[0-9a-f]{64})\}$").expect("static regex")
});

static CONVENTIONAL_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Za-z_!'+\-/=.]+$").expect("static regex"));

static RELAXED_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9A-Za-z_.!#$%&'*+\-/=?^`{|}~]+$").expect("static regex")
});

static QUOTED_LOCAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^"(.*)"$"#).expect("static regex"));

static QUOTED_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\(.)").expect("static regex"));

static LEADING_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\((.+?)\)(.+)$").expect("static regex"));

static TRAILING_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+)\((.+?)\)$").expect("static regex"));

static TRAILING_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)[0-9]+$").expect("static regex"));

pub(crate) fn is_conventional_mailbox(value: &str) -> bool {
    CONVENTIONAL_MAILBOX.is_match(value)
}

pub(crate) fn is_relaxed_mailbox(value: &str) -> bool {
    RELAXED_MAILBOX.is_match(value)
}

pub(crate) fn is_conventional_tag(value: &str) -> bool {
    CONVENTIONAL_TAG.is_match(value)
}

pub(crate) fn is_relaxed_tag(value: &str) -> bool {
    RELAXED_TAG.is_match(value)
}

pub(crate) fn is_standard(value: &str) -> bool {
    STANDARD_LOCAL.is_match(value)
}

pub fn is_redacted(value: &str) -> bool {
    REDACTED.is_match(value)
}

/// Any `{hexdigest}` the address redaction can produce.
pub fn is_redacted_digest(value: &str) -> bool {
    REDACTED_DIGEST.is_match(value)
}

/// Inner text of a fully double-quoted local part, quoted pairs unescaped.
pub(crate) fn unquote(value: &str) -> Option<String> {
    QUOTED_LOCAL
        .captures(value)
        .map(|caps| QUOTED_PAIR.replace_all(&caps[1], "$1").into_owned())
}

/// Removes one comment; a trailing `rest(comment)` wins over a leading
/// `(comment)rest`.
pub(crate) fn split_comment(value: &str) -> (String, Option<String>) {
    let mut rest = value.to_string();
    let mut comment = None;
    if let Some(caps) = LEADING_COMMENT.captures(value) {
        comment = Some(caps[1].to_string());
        rest = caps[2].to_string();
    }
    if let Some(caps) = TRAILING_COMMENT.captures(&rest) {
        comment = Some(caps[2].to_string());
        rest = caps[1].to_string();
    }
    (rest, comment)
}

pub(crate) fn strip_trailing_digits(value: &str) -> Option<&str> {
    TRAILING_DIGITS
        .captures(value)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unquote_handles_escapes() {
        assert_eq!(unquote(r#""a\"b\\c""#).as_deref(), Some(r#"a"b\c"#));
        assert_eq!(unquote("plain"), None);
    }

    #[test]
    fn comments_leading_and_trailing() {
        assert_eq!(
            split_comment("(oops)user"),
            ("user".to_string(), Some("oops".to_string()))
        );
        assert_eq!(
            split_comment("user(oops)"),
            ("user".to_string(), Some("oops".to_string()))
        );
        assert_eq!(split_comment("user"), ("user".to_string(), None));
    }

    #[test]
    fn trailing_comment_wins() {
        let (rest, comment) = split_comment("(first)user(second)");
        assert_eq!(rest, "user");
        assert_eq!(comment.as_deref(), Some("second"));
    }

    #[test]
    fn standard_grammar() {
        assert!(is_standard(r#""quoted with space".atom"#));
        assert!(is_standard("first(comment)"));
        assert!(!is_standard("first..last"));
        assert!(!is_standard(r#""unterminated"#));
    }
}
