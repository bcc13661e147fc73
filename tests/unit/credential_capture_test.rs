use sshpot::attempts::record::AttemptRecord;
use sshpot::attempts::{LogSink, MemorySink, SinkError};
use sshpot::auth::{AuthBackend, AuthDecision, CredentialCapture};
use sshpot::ssh::session::ClientSession;
use std::sync::Arc;

struct DenyAll;

impl AuthBackend for DenyAll {
    fn authenticate(&self, _username: &str, _password: &str) -> AuthDecision {
        AuthDecision::Reject
    }
}

struct BrokenSink;

impl LogSink for BrokenSink {
    fn append(&self, _record: AttemptRecord) -> Result<(), SinkError> {
        Err(SinkError::Full)
    }
}

fn session() -> ClientSession {
    ClientSession::new("192.0.2.44:60123".parse().unwrap(), "c0ffee00".to_string())
}

#[test]
fn login_attempt_is_recorded_verbatim() {
    let sink = Arc::new(MemorySink::new());
    let capture = CredentialCapture::accept_all(sink.clone());
    let mut s = session();

    let decision = capture.capture(&mut s, "admin", "admin123");
    assert_eq!(decision, AuthDecision::Accept);
    assert_eq!(s.username, "admin");
    assert_eq!(s.password, "admin123");

    let records = sink.records();
    assert_eq!(records.len(), 1);
    match &records[0] {
        AttemptRecord::LoginAttempt {
            ip,
            port,
            protocol,
            username,
            password,
            ..
        } => {
            assert_eq!(ip, "192.0.2.44");
            assert_eq!(*port, 60123);
            assert_eq!(protocol, "ssh");
            assert_eq!(username, "admin");
            assert_eq!(password, "admin123");
        }
        other => panic!("unexpected record: {other:?}"),
    }
}

#[test]
fn every_attempt_is_recorded_and_last_one_wins() {
    let sink = Arc::new(MemorySink::new());
    let capture = CredentialCapture::accept_all(sink.clone());
    let mut s = session();

    capture.capture(&mut s, "root", "toor");
    capture.capture(&mut s, "pi", "raspberry");
    assert_eq!(sink.records().len(), 2);
    assert_eq!(s.username, "pi");
    assert_eq!(s.password, "raspberry");
}

#[test]
fn empty_and_unicode_credentials_are_kept() {
    let sink = Arc::new(MemorySink::new());
    let capture = CredentialCapture::accept_all(sink.clone());
    let mut s = session();

    capture.capture(&mut s, "", "pässwörd \"quoted\"");
    match &sink.records()[0] {
        AttemptRecord::LoginAttempt {
            username, password, ..
        } => {
            assert_eq!(username, "");
            assert_eq!(password, "pässwörd \"quoted\"");
        }
        other => panic!("unexpected record: {other:?}"),
    }
    assert_eq!(s.display_username(), "user");
}

#[test]
fn custom_backend_still_records() {
    let sink = Arc::new(MemorySink::new());
    let capture = CredentialCapture::new(sink.clone(), Arc::new(DenyAll));
    let mut s = session();

    assert_eq!(capture.capture(&mut s, "root", "x"), AuthDecision::Reject);
    assert_eq!(sink.records().len(), 1);
}

#[test]
fn sink_failure_does_not_change_decision() {
    let capture = CredentialCapture::accept_all(Arc::new(BrokenSink));
    let mut s = session();
    assert_eq!(capture.capture(&mut s, "admin", "admin"), AuthDecision::Accept);
    assert_eq!(s.username, "admin");
}
