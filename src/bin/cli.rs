//! gpgagent CLI Client
//!
//! Command-line interface for talking to a running gpg-agent.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use gpgagent::config::DEFAULT_SOCKET_TEMPLATE;
use gpgagent::{Agent, Config};
use tracing_subscriber::{fmt, EnvFilter};

/// gpgagent CLI
#[derive(Parser, Debug)]
#[command(name = "gpgagent-cli")]
#[command(about = "Query and use a running GnuPG agent")]
#[command(version)]
struct Args {
    /// Agent socket path ($VAR and ${VAR} are expanded)
    #[arg(short, long, default_value = DEFAULT_SOCKET_TEMPLATE)]
    socket: String,

    /// Timeout for ordinary commands in milliseconds
    #[arg(short, long, default_value = "5000")]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the agent version
    Version,

    /// Run GETINFO for an arbitrary item
    Info {
        /// Item to query (e.g. pid, socket_name)
        what: String,
    },

    /// Check whether the agent holds a secret key
    HaveKey {
        /// Keygrip of the key
        keygrip: String,
    },

    /// Decrypt a ciphertext S-expression, writing plaintext to stdout
    Decrypt {
        /// Keygrip of the decryption key
        keygrip: String,

        /// Read ciphertext from this file instead of stdin
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

fn main() {
    // Initialize tracing/logging (stderr, so stdout stays clean for data)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,gpgagent=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::builder()
        .socket_path(&args.socket)
        .command_timeout_ms(args.timeout_ms)
        .build();

    let agent = Agent::connect(config)?;
    tracing::debug!("Connected to {}", agent.session().endpoint());

    let result = execute(&agent, args.command);
    agent.close()?;
    result
}

fn execute(agent: &Agent, command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Version => println!("{}", agent.query_version()?),
        Commands::Info { what } => println!("{}", agent.query_info(&what)?),
        Commands::HaveKey { keygrip } => {
            let present = agent.have_key(&keygrip)?;
            println!("{}", if present { "present" } else { "absent" });
        }
        Commands::Decrypt { keygrip, input } => {
            let ciphertext = match input {
                Some(path) => fs::read(path)?,
                None => {
                    let mut buf = Vec::new();
                    io::stdin().read_to_end(&mut buf)?;
                    buf
                }
            };
            let plaintext = agent.decrypt(&keygrip, &ciphertext)?;
            let mut stdout = io::stdout().lock();
            stdout.write_all(&plaintext)?;
            stdout.flush()?;
        }
    }
    Ok(())
}
