//! Reader and writer for `.netrc` credential files.
//!
//! The file is a stream of whitespace separated tokens, so an entry may span
//! any number of lines. Values may be double quoted. Entries are keyed by
//! machine name and kept in file order; comments are dropped when the file is
//! written back.

use std::iter::Peekable;
use std::path::{Path, PathBuf};
use std::str::Chars;

use indexmap::IndexMap;
use log::debug;
use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

#[derive(Error, Debug)]
pub enum NetrcError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error
    },
    #[error("{}:{line}: {message}", path.display())]
    Syntax {
        path: PathBuf,
        line: usize,
        message: String
    },
    #[error("{field} may not be empty")]
    InvalidValue { field: &'static str }
}

type Result<T> = std::result::Result<T, NetrcError>;

/// login/password pair stored for one machine
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Entry {
    pub login: String,
    /// the `password` field; holds the access token for our host
    pub secret: String,
    pub account: Option<String>
}

#[derive(Debug)]
pub struct Netrc {
    path: PathBuf,
    machines: IndexMap<String, Entry>,
    default: Option<Entry>,
    macros: IndexMap<String, Vec<String>>
}

enum Target {
    Machine(String),
    Default
}

struct Token {
    text: String,
    line: usize
}

/// Splits netrc content into tokens, keeping track of the current line
struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize
}

impl<'a> Lexer<'a> {
    fn new(content: &'a str) -> Self {
        Self { chars: content.chars().peekable(), line: 1 }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.bump() {
            if c == '\n' {
                break;
            }
        }
    }

    /// Next token, or `Err(line)` for a quote that is never closed
    fn next_token(&mut self) -> std::result::Result<Option<Token>, usize> {
        loop {
            match self.chars.peek().copied() {
                None => return Ok(None),
                Some(c) if c.is_whitespace() => { self.bump(); },
                Some('#') => self.skip_line(),
                Some(_) => break
            }
        }

        let line = self.line;
        let mut text = String::new();
        if self.chars.peek() == Some(&'"') {
            self.bump();
            loop {
                match self.bump() {
                    None => return Err(line),
                    Some('"') => break,
                    Some('\\') => text.push(self.bump().ok_or(line)?),
                    Some(c) => text.push(c)
                }
            }
        } else {
            while let Some(c) = self.chars.peek().copied() {
                if c.is_whitespace() {
                    break;
                }
                self.bump();
                if c == '\\' {
                    if let Some(escaped) = self.bump() {
                        text.push(escaped);
                    }
                } else {
                    text.push(c);
                }
            }
        }

        Ok(Some(Token { text, line }))
    }

    /// Macro bodies start on the line after `macdef NAME` and end at a blank line
    fn macro_body(&mut self) -> Vec<String> {
        self.skip_line();
        let mut body = Vec::new();
        loop {
            let mut line = String::new();
            let mut terminated = false;
            while let Some(c) = self.bump() {
                if c == '\n' {
                    terminated = true;
                    break;
                }
                line.push(c);
            }
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                break;
            }
            body.push(line.to_string());
            if !terminated {
                break;
            }
        }
        body
    }
}

impl Netrc {
    /// Load the file at `path`. A missing file is an empty store
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        match fs::read_to_string(&path).await {
            Ok(content) => {
                debug!("Loading credentials from {}", path.display());
                Self::parse(path, &content)
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No credential file at {}", path.display());
                Ok(Self::empty(path))
            },
            Err(source) => Err(NetrcError::Io { path, source })
        }
    }

    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            machines: IndexMap::new(),
            default: None,
            macros: IndexMap::new()
        }
    }

    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Result<Self> {
        let mut netrc = Self::empty(path);
        let mut current: Option<(Target, Entry)> = None;
        let mut lexer = Lexer::new(content);

        while let Some(token) = netrc.next_token(&mut lexer)? {
            match token.text.as_str() {
                "machine" => {
                    let name = netrc.value_after(&mut lexer, &token)?;
                    netrc.commit(current.take());
                    current = Some((Target::Machine(name), Entry::default()));
                },
                "default" => {
                    netrc.commit(current.take());
                    current = Some((Target::Default, Entry::default()));
                },
                keyword @ ("login" | "password" | "account") => {
                    let value = netrc.value_after(&mut lexer, &token)?;
                    let Some((_, entry)) = current.as_mut() else {
                        return Err(netrc.syntax(token.line, format!("'{keyword}' appears before any machine")));
                    };
                    match keyword {
                        "login" => entry.login = value,
                        "password" => entry.secret = value,
                        _ => entry.account = Some(value)
                    }
                },
                "macdef" => {
                    let name = netrc.value_after(&mut lexer, &token)?;
                    netrc.commit(current.take());
                    let body = lexer.macro_body();
                    netrc.macros.insert(name, body);
                },
                other => return Err(netrc.syntax(token.line, format!("unexpected token '{other}'")))
            }
        }
        netrc.commit(current);

        Ok(netrc)
    }

    fn next_token(&self, lexer: &mut Lexer) -> Result<Option<Token>> {
        lexer.next_token()
            .map_err(|line| self.syntax(line, "unterminated quoted value"))
    }

    fn value_after(&self, lexer: &mut Lexer, keyword: &Token) -> Result<String> {
        self.next_token(lexer)?
            .map(|token| token.text)
            .ok_or_else(|| self.syntax(keyword.line, format!("expected a value after '{}'", keyword.text)))
    }

    fn syntax(&self, line: usize, message: impl Into<String>) -> NetrcError {
        NetrcError::Syntax {
            path: self.path.clone(),
            line,
            message: message.into()
        }
    }

    fn commit(&mut self, pending: Option<(Target, Entry)>) {
        match pending {
            // later blocks for the same machine replace earlier ones
            Some((Target::Machine(name), entry)) => { self.machines.insert(name, entry); },
            Some((Target::Default, entry)) => self.default = Some(entry),
            None => {}
        }
    }

    pub fn get(&self, host: &str) -> Option<&Entry> {
        self.machines.get(host)
    }

    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.machines.keys().map(String::as_str)
    }

    /// Insert or fully replace the entry for `host`. Not persisted until [`Netrc::save`]
    pub fn set(&mut self, host: &str, login: &str, secret: &str) -> Result<()> {
        check_value("host", host)?;
        check_value("login", login)?;
        check_value("password", secret)?;

        self.machines.insert(host.into(), Entry {
            login: login.into(),
            secret: secret.into(),
            account: None
        });
        Ok(())
    }

    pub fn remove(&mut self, host: &str) -> Option<Entry> {
        self.machines.shift_remove(host)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for (name, entry) in &self.machines {
            out.push_str(&format!("machine {}\n", quote(name)));
            render_entry(&mut out, entry);
        }
        for (name, body) in &self.macros {
            out.push_str(&format!("macdef {}\n", quote(name)));
            for line in body {
                out.push_str(line);
                out.push('\n');
            }
            out.push('\n');
        }
        // default has to come last
        if let Some(entry) = &self.default {
            out.push_str("default\n");
            render_entry(&mut out, entry);
        }
        out
    }

    fn temp_path(&self) -> PathBuf {
        let name = self.path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "netrc".into());
        self.path.with_file_name(format!("{name}.hazy-tmp"))
    }

    /// Write every entry to a private sibling file, then move it over the
    /// real one. The existing file is left alone if anything fails
    pub async fn save(&self) -> Result<()> {
        debug!("Saving credentials to {}", self.path.display());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await
                .map_err(|source| NetrcError::Io { path: parent.to_path_buf(), source })?;
        }

        let tmp = self.temp_path();
        if let Err(source) = write_private(&tmp, self.render().as_bytes()).await {
            fs::remove_file(&tmp).await.ok();
            return Err(NetrcError::Io { path: tmp, source });
        }

        fs::rename(&tmp, &self.path).await
            .map_err(|source| NetrcError::Io { path: self.path.clone(), source })
    }
}

/// write `contents` to a file only its owner can read
async fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    // mode() only applies when the file is created
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600)).await?;
    }
    file.write_all(contents).await?;
    file.sync_all().await?;
    Ok(())
}

fn quote(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value.starts_with('#')
        || value.chars().any(|c| c.is_whitespace() || c == '"' || c == '\\');
    if !needs_quotes {
        return value.to_string();
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

fn render_entry(out: &mut String, entry: &Entry) {
    if !entry.login.is_empty() {
        out.push_str(&format!("  login {}\n", quote(&entry.login)));
    }
    if !entry.secret.is_empty() {
        out.push_str(&format!("  password {}\n", quote(&entry.secret)));
    }
    if let Some(account) = &entry.account {
        out.push_str(&format!("  account {}\n", quote(account)));
    }
}

fn check_value(field: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        Err(NetrcError::InvalidValue { field })
    } else {
        Ok(())
    }
}
