use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "aar", about = "Adaptive Agent Runtime command-line front end", version)]
pub struct Cli {
    /// Path to a RuntimeConfig file (AAR_* env vars still take precedence).
    #[arg(long, global = true, env = "AAR_CONFIG_FILE")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Drive one turn through the runtime in-process and print the
    /// resulting events as JSON.
    Run {
        #[arg(long, default_value = "cli-app")]
        app: String,
        #[arg(long, default_value = "cli-user")]
        user: String,
        #[arg(long, default_value = "cli-session")]
        session: String,
        /// The user's message for this turn.
        text: String,
    },
    /// Start the Axum HTTP Surface.
    Serve {
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },
    /// Session CRUD against the configured session store.
    #[command(subcommand)]
    Session(SessionCommand),
}

#[derive(Subcommand)]
pub enum SessionCommand {
    Create { app: String, user: String, session: String },
    Get { app: String, user: String, session: String },
    Delete { app: String, user: String, session: String },
    List { app: String, user: String },
}
