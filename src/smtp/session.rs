use std::io::{self, BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use super::{SmtpError, SmtpReply, SmtpStage};

pub(crate) struct SmtpSession {
    stream: TcpStream,
    reader: BufReader<TcpStream>,
}

impl SmtpSession {
    pub(crate) fn connect(addrs: &[SocketAddr], timeout: Duration) -> io::Result<(Self, SocketAddr)> {
        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(addr, timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(timeout))?;
                    stream.set_write_timeout(Some(timeout))?;
                    let reader = BufReader::new(stream.try_clone()?);
                    return Ok((Self { stream, reader }, *addr));
                }
                Err(err) => last_err = Some(err),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                "no socket address available",
            )
        }))
    }

    /// Reads the server greeting; anything but 2xx is a rejection.
    pub(crate) fn greeting(&mut self) -> Result<SmtpReply, SmtpError> {
        let reply = self
            .read_reply()
            .map_err(|source| SmtpError::io(SmtpStage::Greeting, source))?;
        expect_positive(SmtpStage::Greeting, reply)
    }

    /// Sends `command` and requires a 2xx/3xx reply.
    pub(crate) fn command(&mut self, command: &str, stage: SmtpStage) -> Result<SmtpReply, SmtpError> {
        self.send_command(command)
            .and_then(|()| self.read_reply())
            .map_err(|source| SmtpError::io(stage, source))
            .and_then(|reply| expect_positive(stage, reply))
    }

    /// Best-effort `QUIT`; the connection is dropped either way.
    pub(crate) fn quit(mut self) {
        if self.send_command("QUIT").is_ok() {
            let _ = self.read_reply();
        }
    }

    fn send_command(&mut self, command: &str) -> io::Result<()> {
        let mut line = command.as_bytes().to_vec();
        line.extend_from_slice(b"\r\n");
        self.stream.write_all(&line)?;
        self.stream.flush()
    }

    pub(crate) fn read_reply(&mut self) -> io::Result<SmtpReply> {
        let mut code = None;
        let mut message_lines = Vec::new();
        loop {
            let mut raw = String::new();
            let bytes = self.reader.read_line(&mut raw)?;
            if bytes == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed while reading reply",
                ));
            }
            let line = raw.trim_end_matches(['\r', '\n']);
            if line.len() < 3 || !line.is_char_boundary(3) {
                return Err(invalid_data(format!("invalid SMTP reply: '{line}'")));
            }
            let code_part = &line[..3];
            let parsed_code = code_part
                .parse::<u16>()
                .map_err(|_| invalid_data(format!("invalid SMTP status code: '{code_part}'")))?;
            match code {
                Some(existing) if existing != parsed_code => {
                    return Err(invalid_data(format!(
                        "inconsistent SMTP reply codes: {existing} vs {parsed_code}"
                    )));
                }
                Some(_) => {}
                None => code = Some(parsed_code),
            }
            let continuation = line.as_bytes().get(3).copied() == Some(b'-');
            message_lines.push(line.get(4..).unwrap_or("").to_string());
            if !continuation {
                break;
            }
        }
        Ok(SmtpReply {
            code: code.ok_or_else(|| invalid_data("SMTP reply missing status code".to_string()))?,
            message: message_lines.join("\n"),
        })
    }
}

fn expect_positive(stage: SmtpStage, reply: SmtpReply) -> Result<SmtpReply, SmtpError> {
    if reply.is_positive_completion() || reply.is_positive_intermediate() {
        Ok(reply)
    } else {
        Err(SmtpError::Rejected {
            stage,
            code: reply.code,
            message: reply.message,
        })
    }
}

fn invalid_data(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}
