//! Offline summary of stored attempt files, used by `sshpot report`.

use super::record::AttemptRecord;
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Aggregated view over every `*.jsonl` file in a log directory.
#[derive(Debug, Default, Serialize)]
pub struct AttemptSummary {
    pub files: usize,
    pub total: usize,
    pub malformed_lines: usize,
    pub login_attempts: usize,
    pub commands: usize,
    pub accesses: usize,
    pub unique_ips: usize,
    pub top_ips: Vec<(String, usize)>,
    pub top_usernames: Vec<(String, usize)>,
    pub top_passwords: Vec<(String, usize)>,
    pub top_credentials: Vec<(String, usize)>,
    pub top_commands: Vec<(String, usize)>,
    pub latest: Vec<AttemptRecord>,
}

/// List attempt files in `dir`, oldest first (file names are ISO dates).
pub fn attempt_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("reading log dir: {}", dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) == Some("jsonl") && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Parse every line of every attempt file. Malformed lines are counted.
pub fn read_attempts(dir: &Path) -> Result<(Vec<AttemptRecord>, usize, usize)> {
    let files = attempt_files(dir)?;
    let mut records = Vec::new();
    let mut malformed = 0;
    for file in &files {
        let content = std::fs::read_to_string(file)
            .with_context(|| format!("reading attempt file: {}", file.display()))?;
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            match serde_json::from_str::<AttemptRecord>(line) {
                Ok(rec) => records.push(rec),
                Err(_) => malformed += 1,
            }
        }
    }
    Ok((records, files.len(), malformed))
}

pub fn summarize(dir: &Path, top: usize) -> Result<AttemptSummary> {
    let (mut records, files, malformed_lines) = read_attempts(dir)?;
    records.sort_by_key(|r| r.timestamp());

    let mut summary = AttemptSummary {
        files,
        total: records.len(),
        malformed_lines,
        ..Default::default()
    };

    let mut ips: HashMap<String, usize> = HashMap::new();
    let mut usernames: HashMap<String, usize> = HashMap::new();
    let mut passwords: HashMap<String, usize> = HashMap::new();
    let mut credentials: HashMap<String, usize> = HashMap::new();
    let mut commands: HashMap<String, usize> = HashMap::new();
    let mut unique = BTreeSet::new();

    for rec in &records {
        unique.insert(rec.ip().to_string());
        *ips.entry(rec.ip().to_string()).or_default() += 1;
        match rec {
            AttemptRecord::LoginAttempt {
                username, password, ..
            } => {
                summary.login_attempts += 1;
                *usernames.entry(username.clone()).or_default() += 1;
                *passwords.entry(password.clone()).or_default() += 1;
                *credentials
                    .entry(format!("{username}:{password}"))
                    .or_default() += 1;
            }
            AttemptRecord::Command { command, .. } => {
                summary.commands += 1;
                *commands.entry(command.clone()).or_default() += 1;
            }
            AttemptRecord::Access { .. } => summary.accesses += 1,
        }
    }

    summary.unique_ips = unique.len();
    summary.top_ips = top_n(ips, top);
    summary.top_usernames = top_n(usernames, top);
    summary.top_passwords = top_n(passwords, top);
    summary.top_credentials = top_n(credentials, top);
    summary.top_commands = top_n(commands, top);
    let skip = records.len().saturating_sub(top);
    summary.latest = records.into_iter().skip(skip).collect();
    Ok(summary)
}

/// Highest counts first; ties broken alphabetically so output is stable.
fn top_n(counts: HashMap<String, usize>, n: usize) -> Vec<(String, usize)> {
    let mut v: Vec<_> = counts.into_iter().collect();
    v.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    v.truncate(n);
    v
}

impl AttemptSummary {
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} records in {} file(s), {} malformed line(s) skipped",
            self.total, self.files, self.malformed_lines
        );
        let _ = writeln!(
            out,
            "  login attempts: {}\n  commands:       {}\n  accesses:       {}\n  unique ips:     {}",
            self.login_attempts, self.commands, self.accesses, self.unique_ips
        );
        render_table(&mut out, "Top source IPs", &self.top_ips);
        render_table(&mut out, "Top usernames", &self.top_usernames);
        render_table(&mut out, "Top passwords", &self.top_passwords);
        render_table(&mut out, "Top credential pairs", &self.top_credentials);
        render_table(&mut out, "Top commands", &self.top_commands);

        if !self.latest.is_empty() {
            let _ = writeln!(out, "\nLatest records:");
            for rec in &self.latest {
                let detail = match rec {
                    AttemptRecord::LoginAttempt {
                        username, password, ..
                    } => format!("{username}:{password}"),
                    AttemptRecord::Command {
                        username, command, ..
                    } => format!("{username} $ {command}"),
                    AttemptRecord::Access { data, .. } => format!("{:?}", data),
                };
                let _ = writeln!(
                    out,
                    "  {} {:<13} {:<15} {}",
                    rec.timestamp().format("%Y-%m-%d %H:%M:%S"),
                    rec.kind(),
                    rec.ip(),
                    detail
                );
            }
        }
        out
    }
}

fn render_table(out: &mut String, title: &str, rows: &[(String, usize)]) {
    if rows.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{title}:");
    for (value, count) in rows {
        let _ = writeln!(out, "  {count:>6}  {value}");
    }
}
