//! Transport Module
//!
//! Unix domain socket plumbing.
//!
//! ## Failure Classes
//! - `Timeout`: slow agent, connection still usable
//! - `Transport`: connection dead, open a new one

mod endpoint;
mod connection;

pub use endpoint::{expand_env, Endpoint};
pub use connection::Transport;
