use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256};

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DigestKind {
    Md5,
    #[default]
    Sha1,
    Sha256,
}

impl DigestKind {
    /// Kind whose hex digest has `len` characters.
    pub fn from_hex_len(len: usize) -> Option<Self> {
        match len {
            32 => Some(Self::Md5),
            40 => Some(Self::Sha1),
            64 => Some(Self::Sha256),
            _ => None,
        }
    }
}

/// Lowercase hex digest of `input` followed by `secret`.
pub(crate) fn hex_digest(kind: DigestKind, input: &str, secret: &str) -> String {
    let mut message = String::with_capacity(input.len() + secret.len());
    message.push_str(input);
    message.push_str(secret);
    match kind {
        DigestKind::Md5 => hex::encode(Md5::digest(message.as_bytes())),
        DigestKind::Sha1 => hex::encode(Sha1::digest(message.as_bytes())),
        DigestKind::Sha256 => hex::encode(Sha256::digest(message.as_bytes())),
    }
}
