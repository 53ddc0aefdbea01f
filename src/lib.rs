//! # gpgagent
//!
//! A synchronous client for the GnuPG agent's Assuan protocol:
//! - Socket endpoint resolution with environment expansion
//! - Percent-escaped line codec with full response classification
//! - Sessions with a mandatory liveness probe and one command in flight
//! - Capability query, key-presence check and decryption
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Agent                                │
//! │        (query_version / have_key / decrypt)                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Session                               │
//! │         (greeting + probe, Busy gate, draining)              │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Protocol   │          │  Transport  │
//!   │   (codec)   │          │ (UnixStream)│
//!   └─────────────┘          └──────┬──────┘
//!                                   │
//!                                   ▼
//!                           ┌─────────────┐
//!                           │  gpg-agent  │
//!                           │  (socket)   │
//!                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod transport;
pub mod session;
pub mod agent;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{AgentError, Result};
pub use config::Config;
pub use agent::Agent;
pub use session::{Session, SessionState};
pub use transport::Endpoint;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of gpgagent
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
