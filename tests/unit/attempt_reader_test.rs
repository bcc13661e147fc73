use sshpot::attempts::reader::{attempt_files, read_attempts, summarize};
use sshpot::attempts::record::AttemptRecord;
use std::io::Write;
use std::net::SocketAddr;
use std::path::Path;

fn addr(s: &str) -> SocketAddr {
    s.parse().unwrap()
}

fn write_file(dir: &Path, name: &str, records: &[AttemptRecord], junk: &[&str]) {
    let mut f = std::fs::File::create(dir.join(name)).unwrap();
    for r in records {
        writeln!(f, "{}", serde_json::to_string(r).unwrap()).unwrap();
    }
    for line in junk {
        writeln!(f, "{line}").unwrap();
    }
}

fn sample_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let a = addr("203.0.113.5:50000");
    let b = addr("198.51.100.9:50001");
    write_file(
        dir.path(),
        "2024-05-01.jsonl",
        &[
            AttemptRecord::login_attempt(&a, "root", "123456"),
            AttemptRecord::login_attempt(&a, "root", "admin"),
            AttemptRecord::command(&a, "root", "admin", "uname -a"),
        ],
        &["{not json", ""],
    );
    write_file(
        dir.path(),
        "2024-05-02.jsonl",
        &[
            AttemptRecord::login_attempt(&b, "admin", "admin"),
            AttemptRecord::command(&b, "admin", "admin", "uname -a"),
            AttemptRecord::command(&b, "admin", "admin", "cat /etc/passwd"),
            AttemptRecord::access(&b, b"\x00\x01hello"),
        ],
        &["{\"type\":\"unknown\"}"],
    );
    std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
    dir
}

#[test]
fn only_jsonl_files_are_listed_in_date_order() {
    let dir = sample_dir();
    let files = attempt_files(dir.path()).unwrap();
    let names: Vec<_> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["2024-05-01.jsonl", "2024-05-02.jsonl"]);
}

#[test]
fn malformed_lines_are_counted_not_fatal() {
    let dir = sample_dir();
    let (records, files, malformed) = read_attempts(dir.path()).unwrap();
    assert_eq!(records.len(), 7);
    assert_eq!(files, 2);
    assert_eq!(malformed, 2);
}

#[test]
fn summary_counts_by_type_and_ranks() {
    let dir = sample_dir();
    let summary = summarize(dir.path(), 2).unwrap();

    assert_eq!(summary.total, 7);
    assert_eq!(summary.login_attempts, 3);
    assert_eq!(summary.commands, 3);
    assert_eq!(summary.accesses, 1);
    assert_eq!(summary.unique_ips, 2);
    assert_eq!(summary.malformed_lines, 2);

    assert_eq!(summary.top_ips[0], ("198.51.100.9".to_string(), 4));
    assert_eq!(summary.top_usernames[0], ("root".to_string(), 2));
    assert_eq!(summary.top_passwords[0], ("admin".to_string(), 2));
    assert_eq!(summary.top_commands[0], ("uname -a".to_string(), 2));
    assert_eq!(summary.top_credentials.len(), 2);
    assert_eq!(summary.latest.len(), 2);
}

#[test]
fn text_report_mentions_sections() {
    let dir = sample_dir();
    let text = summarize(dir.path(), 5).unwrap().render_text();
    assert!(text.starts_with("7 records in 2 file(s), 2 malformed line(s) skipped"));
    assert!(text.contains("Top usernames:"));
    assert!(text.contains("Top commands:"));
    assert!(text.contains("Latest records:"));
}

#[test]
fn json_report_serializes() {
    let dir = sample_dir();
    let summary = summarize(dir.path(), 3).unwrap();
    let value = serde_json::to_value(&summary).unwrap();
    assert_eq!(value["total"], 7);
    assert_eq!(value["top_ips"][0][0], "198.51.100.9");
}

#[test]
fn missing_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(summarize(&dir.path().join("missing"), 10).is_err());
}
