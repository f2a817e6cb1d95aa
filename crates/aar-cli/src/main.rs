use clap::Parser;
use tracing_subscriber::EnvFilter;

use aar_cli::cli::{Cli, Command, SessionCommand};
use aar_cli::{commands, context};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env().add_directive("aar_cli=info".parse().unwrap())).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run { app, user, session, text } => match context::build_core(cli.config.as_deref()) {
            Ok(core) => commands::run::run(&core, &app, &user, &session, &text).await,
            Err(e) => Err(e),
        },
        Command::Serve { port } => match context::build_core(cli.config.as_deref()) {
            Ok(core) => commands::serve::serve(core, port).await,
            Err(e) => Err(e),
        },
        Command::Session(session_command) => match context::build_core(cli.config.as_deref()) {
            Ok(core) => match session_command {
                SessionCommand::Create { app, user, session } => commands::session::create(&core, &app, &user, &session).await,
                SessionCommand::Get { app, user, session } => commands::session::get(&core, &app, &user, &session).await,
                SessionCommand::Delete { app, user, session } => commands::session::delete(&core, &app, &user, &session).await,
                SessionCommand::List { app, user } => commands::session::list(&core, &app, &user).await,
            },
            Err(e) => Err(e),
        },
    };

    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(e.exit_code());
    }
}
