//! Command definitions
//!
//! Represents commands sent to the agent.

use std::fmt;

/// A command: a verb plus zero or more arguments
///
/// Arguments are kept unescaped; escaping happens in the codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    verb: String,
    args: Vec<String>,
}

impl Command {
    /// Create a command with no arguments
    pub fn new(verb: impl Into<String>) -> Self {
        Self {
            verb: verb.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// `GETINFO <what>`
    pub fn getinfo(what: impl Into<String>) -> Self {
        Self::new("GETINFO").arg(what)
    }

    /// `HAVEKEY <keygrip>`
    pub fn havekey(keygrip: impl Into<String>) -> Self {
        Self::new("HAVEKEY").arg(keygrip)
    }

    /// `SETKEY <keygrip>`
    pub fn setkey(keygrip: impl Into<String>) -> Self {
        Self::new("SETKEY").arg(keygrip)
    }

    /// `PKDECRYPT`
    pub fn pkdecrypt() -> Self {
        Self::new("PKDECRYPT")
    }

    /// `OPTION <name>=<value>`
    pub fn option(name: &str, value: &str) -> Self {
        Self::new("OPTION").arg(format!("{}={}", name, value))
    }

    /// `BYE`
    pub fn bye() -> Self {
        Self::new("BYE")
    }

    pub fn verb(&self) -> &str {
        &self.verb
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for Command {
    /// Verb and argument count only; arguments may be sensitive
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} args)", self.verb, self.args.len())
    }
}
