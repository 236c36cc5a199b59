//! kv CLI
//!
//! Set, get and list keys in the local store.

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use kv::{Command, Config, Reply, Result, Store};
use tracing_subscriber::{fmt, EnvFilter};

/// kv CLI
#[derive(Parser, Debug)]
#[command(name = "kv")]
#[command(about = "Set, get and list key-value pairs in a local store")]
#[command(version)]
struct Args {
    /// Backing file (defaults to ~/.kv.db)
    #[arg(long, global = true, env = "KV_DB")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Set a value
    #[command(visible_alias = "s")]
    Set {
        /// The key to set
        #[arg(short, long)]
        key: String,

        /// The value to set
        #[arg(short, long)]
        value: String,
    },

    /// Get a value
    #[command(visible_alias = "g")]
    Get {
        /// The key to get
        #[arg(short, long)]
        key: String,
    },

    /// List all keys
    #[command(visible_alias = "l")]
    List,
}

impl From<Commands> for Command {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Set { key, value } => Command::Set {
                key: key.into_bytes(),
                value: value.into_bytes(),
            },
            Commands::Get { key } => Command::Get {
                key: key.into_bytes(),
            },
            Commands::List => Command::List,
        }
    }
}

fn main() {
    // Logs go to stderr; stdout carries only command output
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let command = Command::from(args.command);
    command.validate()?;

    let config = match args.db.filter(|p| !p.as_os_str().is_empty()) {
        Some(path) => Config::builder().db_path(path).build(),
        None => Config::from_env(),
    };

    let store = Store::open(&config)?;
    tracing::debug!("kv v{} using {}", kv::VERSION, store.db_path().display());

    // Close on both paths; a command error takes precedence
    let outcome = store.execute(command).and_then(|reply| render(&reply));
    let closed = store.close();
    outcome?;
    closed
}

fn render(reply: &Reply) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for line in reply.lines() {
        out.write_all(line)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}
