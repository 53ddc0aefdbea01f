//! Socket endpoint resolution
//!
//! Expands an environment-templated socket path and checks that it names a
//! Unix domain socket before anything dials it.

use std::fmt;
use std::fs;
use std::io;
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};

use crate::error::{AgentError, Result};

/// Filesystem location of an agent socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    path: PathBuf,
}

impl Endpoint {
    /// Expand `template` against the process environment
    pub fn resolve(template: &str) -> Self {
        Self::resolve_with(template, |name| std::env::var(name).ok())
    }

    /// Expand `template` using `lookup` for variable values
    pub fn resolve_with<F>(template: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            path: PathBuf::from(expand_env(template, lookup)),
        }
    }

    /// Use a path as-is, without expansion
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check that the path exists and is a socket
    pub fn verify(&self) -> Result<()> {
        let metadata = fs::metadata(&self.path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => AgentError::EndpointNotFound {
                path: self.path.clone(),
            },
            _ => AgentError::Transport(format!("stat {}: {}", self.path.display(), e)),
        })?;

        if !metadata.file_type().is_socket() {
            return Err(AgentError::EndpointNotASocket {
                path: self.path.clone(),
            });
        }

        Ok(())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Replace `$NAME` and `${NAME}` with their values
///
/// Unset variables expand to nothing. A `$` that does not start a
/// reference is kept as-is, as is an unterminated `${`.
pub fn expand_env<F>(template: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) if end > 0 => {
                    out.push_str(&lookup(&braced[..end]).unwrap_or_default());
                    rest = &braced[end + 1..];
                }
                _ => {
                    out.push('$');
                    rest = after;
                }
            }
            continue;
        }

        let name_len = after.find(|c: char| !is_name_char(c)).unwrap_or(after.len());
        if name_len == 0 {
            out.push('$');
        } else {
            out.push_str(&lookup(&after[..name_len]).unwrap_or_default());
        }
        rest = &after[name_len..];
    }

    out.push_str(rest);
    out
}
