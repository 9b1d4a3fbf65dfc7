use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread;

use super::{SmtpError, SmtpStage, probe};
use crate::config::Config;

/// One-connection scripted server: sends the banner, then answers each
/// received line with the next canned reply.
fn scripted_server(replies: &'static [&'static str]) -> (u16, thread::JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream.try_clone().expect("clone"));
        stream.write_all(b"220 test.local ESMTP\r\n").expect("banner");
        let mut received = Vec::new();
        for reply in replies {
            let mut line = String::new();
            if reader.read_line(&mut line).expect("read") == 0 {
                break;
            }
            received.push(line.trim_end().to_string());
            stream.write_all(reply.as_bytes()).expect("reply");
        }
        received
    });
    (port, handle)
}

fn local_config(port: u16) -> Config {
    Config::offline().with_smtp_port(port)
}

#[test]
fn host_probe_greets_and_quits() {
    let (port, server) = scripted_server(&["250-test.local\r\n250 SIZE 1000\r\n", "221 bye\r\n"]);
    let reply = probe(&["127.0.0.1".to_string()], &local_config(port), None).expect("probe");
    assert_eq!(reply.code, 250);
    assert_eq!(reply.message, "test.local\nSIZE 1000");

    let received = server.join().expect("server");
    assert_eq!(received, vec!["EHLO localhost", "QUIT"]);
}

#[test]
fn rejected_recipient_is_reported() {
    let (port, server) = scripted_server(&[
        "250 test.local\r\n",
        "250 ok\r\n",
        "550 no such user\r\n",
        "221 bye\r\n",
    ]);
    let err = probe(
        &["127.0.0.1".to_string()],
        &local_config(port),
        Some("nobody@test.local"),
    )
    .expect_err("rejected");
    match err {
        SmtpError::Rejected { stage, code, message } => {
            assert_eq!(stage, SmtpStage::RcptTo);
            assert_eq!(code, 550);
            assert_eq!(message, "no such user");
        }
        other => panic!("unexpected error: {other}"),
    }

    let received = server.join().expect("server");
    assert_eq!(received[1], "MAIL FROM:<postmaster@localhost>");
    assert_eq!(received[2], "RCPT TO:<nobody@test.local>");
}

#[test]
fn no_targets_is_an_error() {
    let err = probe(&[], &Config::offline(), None).expect_err("no target");
    assert!(matches!(err, SmtpError::NoTarget));
}
