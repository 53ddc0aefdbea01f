//! Agent Module
//!
//! High-level operations on top of a [`Session`].
//!
//! ## Responsibilities
//! - Pick the command sequence for each operation
//! - Choose the timeout (interactive for anything that may prompt)
//! - Translate agent `ERR` codes into operation-specific errors

use crate::config::Config;
use crate::error::{AgentError, Result};
use crate::protocol::{Command, ErrorCode, Outcome, Response};
use crate::session::Session;
use crate::transport::Endpoint;

/// Inquiry keyword gpg-agent uses to request the ciphertext
const INQUIRE_CIPHERTEXT: &str = "CIPHERTEXT";

/// Sent when pinentry notifications are enabled; answered with no data
const INQUIRE_PINENTRY_LAUNCHED: &str = "PINENTRY_LAUNCHED";

/// Client for a running gpg-agent
pub struct Agent {
    session: Session,
    config: Config,
}

impl Agent {
    /// Resolve the configured socket template and connect
    pub fn connect(config: Config) -> Result<Self> {
        let endpoint = config.endpoint();
        Self::connect_to(&endpoint, config)
    }

    /// Connect to an explicit endpoint, then send configured options
    pub fn connect_to(endpoint: &Endpoint, config: Config) -> Result<Self> {
        config.validate()?;
        let session = Session::connect(endpoint, &config)?;
        let agent = Self { session, config };

        for (name, value) in &agent.config.options {
            agent.set_option(name, value)?;
        }

        Ok(agent)
    }

    /// `GETINFO version`
    pub fn query_version(&self) -> Result<String> {
        self.query_info("version")
    }

    /// `GETINFO <what>`; returns the data, or the `OK` text if there was none
    pub fn query_info(&self, what: &str) -> Result<String> {
        let response = self.run(&Command::getinfo(what))?.into_result()?;
        Ok(response.text())
    }

    /// `OPTION name=value`
    pub fn set_option(&self, name: &str, value: &str) -> Result<()> {
        if name.is_empty() || name.contains('=') {
            return Err(AgentError::InvalidArgument(format!("invalid option name {:?}", name)));
        }
        self.run(&Command::option(name, value))?.into_result()?;
        Ok(())
    }

    /// Whether the agent holds the secret key for `keygrip`
    ///
    /// Only `NO_SECKEY` means absent; every other `ERR` is an error.
    pub fn have_key(&self, keygrip: &str) -> Result<bool> {
        let response = self.run(&Command::havekey(keygrip))?;

        match response.outcome {
            Outcome::Ok(_) => Ok(true),
            Outcome::Err { code, .. } if code.is_no_secret_key() => {
                tracing::debug!("No secret key for {}", keygrip);
                Ok(false)
            }
            Outcome::Err { code, description } => Err(AgentError::Agent { code, description }),
        }
    }

    /// Decrypt `ciphertext` with the key behind `keygrip`
    ///
    /// Sends `SETKEY`, then `PKDECRYPT`, feeding the ciphertext when the
    /// agent inquires for it. Returns the data the agent sends back.
    pub fn decrypt(&self, keygrip: &str, ciphertext: &[u8]) -> Result<Vec<u8>> {
        if ciphertext.is_empty() {
            return Err(AgentError::InvalidArgument("ciphertext is empty".to_string()));
        }

        let setkey = self.run(&Command::setkey(keygrip))?;
        check_decrypt(keygrip, setkey)?;

        let mut supplied = false;
        let response = self.session.issue_with_inquiry(
            &Command::pkdecrypt(),
            self.config.interactive_timeout(),
            |inquiry| match inquiry.keyword.as_str() {
                INQUIRE_CIPHERTEXT => {
                    supplied = true;
                    Some(ciphertext.to_vec())
                }
                INQUIRE_PINENTRY_LAUNCHED => Some(Vec::new()),
                _ => None,
            },
        )?;
        let response = check_decrypt(keygrip, response)?;

        if !supplied {
            return Err(self.session.fail(AgentError::ProtocolViolation(
                "agent finished PKDECRYPT without asking for the ciphertext".to_string(),
            )));
        }

        tracing::debug!("Decrypted {} bytes with {}", response.data.len(), keygrip);
        Ok(response.data.to_vec())
    }

    /// Close the underlying session; idempotent
    pub fn close(&self) -> Result<()> {
        self.session.close()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn run(&self, command: &Command) -> Result<Response> {
        self.session.issue(command, self.config.command_timeout())
    }
}

/// Map decrypt-path `ERR` codes onto distinct errors
fn check_decrypt(keygrip: &str, response: Response) -> Result<Response> {
    match &response.outcome {
        Outcome::Ok(_) => Ok(response),
        Outcome::Err { code, description } => Err(decrypt_failure(keygrip, *code, description)),
    }
}

fn decrypt_failure(keygrip: &str, code: ErrorCode, description: &str) -> AgentError {
    if code.is_no_secret_key() {
        AgentError::KeyNotFound(keygrip.to_string())
    } else if code.is_canceled() {
        AgentError::UserDeclined(description.to_string())
    } else {
        AgentError::Agent {
            code,
            description: description.to_string(),
        }
    }
}
