//! Optional SMTP connect probe.
//!
//! Used by `HostValidation::Connect` and [`Address::connect`](crate::Address::connect).
//! Probing remote servers is slow, rate limited by most providers and easy
//! to mistake for abuse, so nothing in the library calls it by default.

mod session;

#[cfg(test)]
mod tests;

use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};

use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use session::SmtpSession;

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpStage {
    Connect,
    Greeting,
    Ehlo,
    MailFrom,
    RcptTo,
}

impl fmt::Display for SmtpStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Connect => "connect",
            Self::Greeting => "greeting",
            Self::Ehlo => "EHLO",
            Self::MailFrom => "MAIL FROM",
            Self::RcptTo => "RCPT TO",
        };
        f.write_str(label)
    }
}

/// A raw SMTP reply, preserving the numeric status code and message text.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpReply {
    pub code: u16,
    pub message: String,
}

impl SmtpReply {
    pub fn is_positive_completion(&self) -> bool {
        (200..300).contains(&self.code)
    }

    pub fn is_positive_intermediate(&self) -> bool {
        (300..400).contains(&self.code)
    }

    pub fn is_transient_failure(&self) -> bool {
        (400..500).contains(&self.code)
    }

    pub fn is_permanent_failure(&self) -> bool {
        (500..600).contains(&self.code)
    }
}

#[derive(Debug, Error)]
pub enum SmtpError {
    #[error("no SMTP server to connect to")]
    NoTarget,
    #[error("could not connect to {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: std::io::Error,
    },
    #[error("SMTP I/O failure during {stage}: {source}")]
    Io {
        stage: SmtpStage,
        #[source]
        source: std::io::Error,
    },
    #[error("{stage} rejected: {code} {message}")]
    Rejected {
        stage: SmtpStage,
        code: u16,
        message: String,
    },
}

impl SmtpError {
    pub(crate) fn connect(target: impl Into<String>, source: std::io::Error) -> Self {
        Self::Connect {
            target: target.into(),
            source,
        }
    }

    pub(crate) fn io(stage: SmtpStage, source: std::io::Error) -> Self {
        Self::Io { stage, source }
    }
}

/// Greets the first reachable server among `targets` (banner and `EHLO`),
/// then, with a `recipient`, issues `MAIL FROM` and `RCPT TO`.
///
/// Unreachable servers are skipped; the first server that answers decides
/// the outcome.
pub(crate) fn probe(
    targets: &[String],
    config: &Config,
    recipient: Option<&str>,
) -> Result<SmtpReply, SmtpError> {
    let mut last_err = SmtpError::NoTarget;
    for target in targets {
        let addrs = match resolve(target, config.smtp_port) {
            Ok(addrs) => addrs,
            Err(err) => {
                last_err = err;
                continue;
            }
        };
        let mut session = match SmtpSession::connect(&addrs, config.host_timeout) {
            Ok((session, addr)) => {
                debug!(target = %target, %addr, "smtp connected");
                session
            }
            Err(source) => {
                debug!(target = %target, error = %source, "smtp connect failed");
                last_err = SmtpError::connect(target.as_str(), source);
                continue;
            }
        };
        let outcome = converse(&mut session, config, recipient);
        session.quit();
        return outcome;
    }
    Err(last_err)
}

fn converse(
    session: &mut SmtpSession,
    config: &Config,
    recipient: Option<&str>,
) -> Result<SmtpReply, SmtpError> {
    session.greeting()?;
    let mut reply = session.command(&format!("EHLO {}", config.smtp_helo_name), SmtpStage::Ehlo)?;
    if let Some(recipient) = recipient {
        session.command(
            &format!("MAIL FROM:<{}>", config.smtp_mail_from),
            SmtpStage::MailFrom,
        )?;
        reply = session.command(&format!("RCPT TO:<{recipient}>"), SmtpStage::RcptTo)?;
    }
    Ok(reply)
}

fn resolve(target: &str, port: u16) -> Result<Vec<SocketAddr>, SmtpError> {
    (target, port)
        .to_socket_addrs()
        .map(Iterator::collect)
        .map_err(|source| SmtpError::connect(target, source))
}
