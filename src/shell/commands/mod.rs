mod canned;

use std::collections::HashMap;
use std::time::Duration;

/// Inputs a templated response may use.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub username: &'a str,
    pub hostname: &'a str,
}

/// How a table entry produces its output.
#[derive(Clone, Copy)]
pub enum Response {
    Static(&'static str),
    Template(fn(&RenderContext) -> String),
}

impl Response {
    pub fn render(&self, ctx: &RenderContext) -> String {
        match self {
            Response::Static(text) => (*text).to_string(),
            Response::Template(render) => render(ctx),
        }
    }
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Response::Static(text) => f.debug_tuple("Static").field(text).finish(),
            Response::Template(_) => f.write_str("Template(..)"),
        }
    }
}

/// Exact-match mapping from a normalised command to its canned response.
#[derive(Debug, Clone)]
pub struct CommandTable {
    entries: HashMap<String, Response>,
}

impl CommandTable {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// The stock set of commands an intruder usually tries first.
    pub fn standard() -> Self {
        let mut table = Self::empty();
        table.insert("whoami", Response::Template(canned::whoami));
        table.insert("hostname", Response::Template(canned::hostname));
        table.insert("id", Response::Template(canned::id));
        table.insert("pwd", Response::Template(canned::pwd));
        for key in ["ls", "ls -l", "ls -la"] {
            table.insert(key, Response::Template(canned::ls));
        }
        table.insert("uname -a", Response::Template(canned::uname));
        for key in ["ps aux", "ps -ef"] {
            table.insert(key, Response::Template(canned::ps));
        }
        table.insert("cat /etc/passwd", Response::Template(canned::passwd));
        for key in ["ifconfig", "/sbin/ifconfig"] {
            table.insert(key, Response::Static(canned::IFCONFIG));
        }
        table.insert("uptime", Response::Static(canned::UPTIME));
        for key in ["w", "who"] {
            table.insert(key, Response::Template(canned::who));
        }
        table
    }

    /// Add or replace an entry. The key is normalised first.
    pub fn insert(&mut self, command: &str, response: Response) {
        self.entries.insert(normalize(command), response);
    }

    pub fn lookup(&self, normalized: &str) -> Option<&Response> {
        self.entries.get(normalized)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Piece of terminal output. Pauses let the session loop flush what came
/// before, then wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputChunk {
    Text(String),
    Pause(Duration),
}

/// Result of executing a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub output: Vec<OutputChunk>,
    pub exit_requested: bool,
}

impl CommandResult {
    pub fn output(text: impl Into<String>) -> Self {
        Self {
            output: vec![OutputChunk::Text(text.into())],
            exit_requested: false,
        }
    }

    pub fn exit(hostname: &str) -> Self {
        Self {
            output: vec![OutputChunk::Text(format!(
                "logout\r\nConnection to {hostname} closed.\r\n"
            ))],
            exit_requested: true,
        }
    }

    pub fn empty() -> Self {
        Self {
            output: Vec::new(),
            exit_requested: false,
        }
    }

    /// All text chunks concatenated, pauses skipped.
    pub fn text(&self) -> String {
        self.output
            .iter()
            .filter_map(|chunk| match chunk {
                OutputChunk::Text(t) => Some(t.as_str()),
                OutputChunk::Pause(_) => None,
            })
            .collect()
    }
}

/// Which rule handled a command, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStage {
    Exit,
    Table,
    ChangeDir,
    Cat,
    Sudo,
    NotFound,
}

const EXIT_ALIASES: &[&str] = &["exit", "logout", "quit"];

/// Case-fold and trim.
pub fn normalize(command: &str) -> String {
    command.trim().to_lowercase()
}

/// Resolves a submitted command line to its terminal output.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    table: std::sync::Arc<CommandTable>,
    hostname: String,
    sudo_delay: Duration,
}

impl Dispatcher {
    pub fn new(table: std::sync::Arc<CommandTable>, hostname: String, sudo_delay: Duration) -> Self {
        Self {
            table,
            hostname,
            sudo_delay,
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Pick the rule for an already normalised command.
    pub fn classify(&self, normalized: &str) -> DispatchStage {
        if EXIT_ALIASES.contains(&normalized) {
            DispatchStage::Exit
        } else if self.table.lookup(normalized).is_some() {
            DispatchStage::Table
        } else if normalized.starts_with("cd ") {
            DispatchStage::ChangeDir
        } else if normalized.starts_with("cat ") {
            DispatchStage::Cat
        } else if normalized.starts_with("sudo ") {
            DispatchStage::Sudo
        } else {
            DispatchStage::NotFound
        }
    }

    /// Dispatch a non-empty command line for `username`.
    pub fn dispatch(&self, command: &str, username: &str) -> CommandResult {
        let normalized = normalize(command);
        if normalized.is_empty() {
            return CommandResult::empty();
        }
        let ctx = RenderContext {
            username,
            hostname: &self.hostname,
        };

        match self.classify(&normalized) {
            DispatchStage::Exit => CommandResult::exit(&self.hostname),
            DispatchStage::Table => match self.table.lookup(&normalized) {
                Some(response) => CommandResult::output(response.render(&ctx)),
                None => CommandResult::empty(),
            },
            DispatchStage::ChangeDir => CommandResult::empty(),
            DispatchStage::Cat => {
                let path = normalized["cat ".len()..].trim();
                CommandResult::output(self.cat(path))
            }
            DispatchStage::Sudo => CommandResult {
                output: vec![
                    OutputChunk::Text(format!("[sudo] password for {username}: ")),
                    OutputChunk::Pause(self.sudo_delay),
                    OutputChunk::Text(format!(
                        "\r\n{username} is not in the sudoers file. This incident will be reported.\r\n"
                    )),
                ],
                exit_requested: false,
            },
            DispatchStage::NotFound => {
                let first = command.split_whitespace().next().unwrap_or_default();
                CommandResult::output(format!("bash: {first}: command not found\r\n"))
            }
        }
    }

    fn cat(&self, path: &str) -> String {
        match path {
            "/etc/hostname" => canned::etc_hostname(&self.hostname),
            "/etc/hosts" => canned::etc_hosts(&self.hostname),
            _ => format!("cat: {path}: No such file or directory\r\n"),
        }
    }
}
