//! Command channel to the FEMM engine
//!
//! Every interaction is a single textual call: a prefixed command name and a
//! parenthesised argument list, e.g. `mi_addnode(10, 20)`. Replies come back
//! as text and are parsed into `Reply` values. How the text travels is left
//! to a `Transport`; `ScriptSession` skips the engine entirely and records
//! the calls so they can be rendered into a Lua script.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RemoteError;

/// Problem family of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Problem {
    #[default]
    Magnetics,
    Electrostatics,
    Heat,
    Current,
}

/// Which half of the command namespace a call belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Pre,
    Post,
}

impl Problem {
    /// Code passed to `newdocument`
    pub fn doc_type(self) -> i64 {
        match self {
            Problem::Magnetics => 0,
            Problem::Electrostatics => 1,
            Problem::Heat => 2,
            Problem::Current => 3,
        }
    }

    pub fn prefix(self, mode: Mode) -> &'static str {
        match (self, mode) {
            (Problem::Magnetics, Mode::Pre) => "mi",
            (Problem::Magnetics, Mode::Post) => "mo",
            (Problem::Electrostatics, Mode::Pre) => "ei",
            (Problem::Electrostatics, Mode::Post) => "eo",
            (Problem::Heat, Mode::Pre) => "hi",
            (Problem::Heat, Mode::Post) => "ho",
            (Problem::Current, Mode::Pre) => "ci",
            (Problem::Current, Mode::Post) => "co",
        }
    }

    /// Full command name, e.g. `mi_addnode`
    pub fn command(self, mode: Mode, verb: &str) -> String {
        format!("{}_{}", self.prefix(mode), verb)
    }
}

/// A single call argument
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Number(f64),
    Int(i64),
    Str(String),
    Nil,
}

impl From<f64> for Arg {
    fn from(value: f64) -> Self {
        Arg::Number(value)
    }
}

impl From<i64> for Arg {
    fn from(value: i64) -> Self {
        Arg::Int(value)
    }
}

impl From<u32> for Arg {
    fn from(value: u32) -> Self {
        Arg::Int(value.into())
    }
}

impl From<bool> for Arg {
    fn from(value: bool) -> Self {
        Arg::Int(value as i64)
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Str(value.to_string())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Arg::Str(value)
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Number(v) => write!(f, "{}", v),
            Arg::Int(v) => write!(f, "{}", v),
            Arg::Str(s) => write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
            Arg::Nil => f.write_str("nil"),
        }
    }
}

/// Render `command(arg, arg, ...)`
pub fn format_call(command: &str, args: &[Arg]) -> String {
    let args: Vec<String> = args.iter().map(ToString::to_string).collect();
    format!("{}({})", command, args.join(", "))
}

/// One value of a parsed reply
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
}

/// Parsed engine reply
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reply {
    values: Vec<Value>,
}

impl Reply {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse the engine's textual reply to `command`.
    ///
    /// An empty reply carries no values. A reply starting with `e` is an
    /// error report. Anything else is a bracketed, comma-separated list.
    pub fn parse(command: &str, text: &str) -> Result<Self, RemoteError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Self::empty());
        }
        if text.starts_with('e') {
            return Err(RemoteError::new(command, text));
        }

        let body = text
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .unwrap_or(text);

        let values = split_values(body)
            .into_iter()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| match token.strip_prefix('"') {
                Some(quoted) => Value::Text(quoted.strip_suffix('"').unwrap_or(quoted).to_string()),
                None => match token.parse::<f64>() {
                    Ok(number) => Value::Number(number),
                    Err(_) => Value::Text(token.to_string()),
                },
            })
            .collect();

        Ok(Self { values })
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn numbers(&self) -> Vec<f64> {
        self.values
            .iter()
            .filter_map(|v| match v {
                Value::Number(n) => Some(*n),
                Value::Text(_) => None,
            })
            .collect()
    }

    /// The value of a single-number reply
    pub fn scalar(&self) -> Option<f64> {
        match self.values.as_slice() {
            [Value::Number(n)] => Some(*n),
            _ => None,
        }
    }
}

/// Normalise a path for FEMM: forward slashes only, no doubled separators
pub fn fix_path(path: &str) -> String {
    let mut fixed = path.replace('\\', "/");
    while fixed.contains("//") {
        fixed = fixed.replace("//", "/");
    }
    fixed
}

/// Split on commas outside double-quoted strings
fn split_values(body: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    for (i, c) in body.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ',' if !quoted => {
                tokens.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    tokens.push(&body[start..]);
    tokens
}

/// An open FEMM document. Not reentrant: one caller at a time.
pub trait Session {
    /// Send one command and wait for its reply
    fn call(&mut self, command: &str, args: &[Arg]) -> Result<Reply, RemoteError>;

    /// A call whose reply carries results. Offline sessions record these so
    /// that the results can be reported once the script runs.
    fn query(&mut self, command: &str, args: &[Arg]) -> Result<Reply, RemoteError> {
        self.call(command, args)
    }

    /// Resolve relative paths (saved documents, result files) against `path`
    fn set_current_directory(&mut self, path: &str) -> Result<(), RemoteError> {
        self.call("setcurrentdirectory", &[Arg::from(fix_path(path))]).map(drop)
    }

    fn new_document(&mut self, problem: Problem) -> Result<(), RemoteError> {
        self.call("newdocument", &[Arg::Int(problem.doc_type())]).map(drop)
    }

    fn close_document(&mut self, problem: Problem) -> Result<(), RemoteError> {
        self.call(&problem.command(Mode::Pre, "close"), &[]).map(drop)
    }

    fn quit(&mut self) -> Result<(), RemoteError> {
        self.call("quit", &[]).map(drop)
    }
}

impl<S: Session + ?Sized> Session for &mut S {
    fn call(&mut self, command: &str, args: &[Arg]) -> Result<Reply, RemoteError> {
        (**self).call(command, args)
    }

    fn query(&mut self, command: &str, args: &[Arg]) -> Result<Reply, RemoteError> {
        (**self).query(command, args)
    }
}

/// Moves one call string to the engine and returns its raw reply
pub trait Transport {
    fn exchange(&mut self, line: &str) -> std::io::Result<String>;
}

/// A live session over any `Transport`
pub struct TransportSession<T> {
    transport: T,
}

impl<T: Transport> TransportSession<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn into_inner(self) -> T {
        self.transport
    }
}

impl<T: Transport> Session for TransportSession<T> {
    fn call(&mut self, command: &str, args: &[Arg]) -> Result<Reply, RemoteError> {
        let line = format_call(command, args);
        debug!("-> {}", line);
        let raw = self
            .transport
            .exchange(&line)
            .map_err(|e| RemoteError::new(line.as_str(), e.to_string()))?;
        debug!("<- {}", raw.trim());
        Reply::parse(&line, &raw)
    }
}

/// A recorded script line
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Statement {
    Call { line: String },
    /// A query whose result is stored under `name`
    Probe { name: String, line: String },
}

/// Offline session: records calls instead of sending them.
/// Every call succeeds with an empty reply.
#[derive(Debug, Default)]
pub struct ScriptSession {
    statements: Vec<Statement>,
    probes: usize,
}

impl ScriptSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Every recorded line, probes included, in call order
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.statements.iter().map(|s| match s {
            Statement::Call { line } | Statement::Probe { line, .. } => line.as_str(),
        })
    }

    pub fn probe_names(&self) -> Vec<&str> {
        self.statements
            .iter()
            .filter_map(|s| match s {
                Statement::Probe { name, .. } => Some(name.as_str()),
                Statement::Call { .. } => None,
            })
            .collect()
    }
}

impl Session for ScriptSession {
    fn call(&mut self, command: &str, args: &[Arg]) -> Result<Reply, RemoteError> {
        let line = format_call(command, args);
        debug!("recorded {}", line);
        self.statements.push(Statement::Call { line });
        Ok(Reply::empty())
    }

    fn query(&mut self, command: &str, args: &[Arg]) -> Result<Reply, RemoteError> {
        self.probes += 1;
        let name = format!("result_{}", self.probes);
        let line = format_call(command, args);
        debug!("recorded probe {} = {}", name, line);
        self.statements.push(Statement::Probe { name, line });
        Ok(Reply::empty())
    }
}
