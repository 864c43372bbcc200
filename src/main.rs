//! parley CLI binary entry point.

use clap::Parser;
use parley::cli::{repl, Cli, Commands, SessionCommands};
use parley::client::ChatSession;
use parley::session::SessionOrigin;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> parley::error::Result<()> {
    let config = cli.connection.resolve()?;
    let mut chat = ChatSession::new(config)?;

    match cli.command {
        Commands::Chat => {
            chat.ensure_session().await?;
            repl::run(&mut chat).await
        }
        Commands::Send(args) => {
            let input = args.input()?;
            chat.ensure_session().await?;
            let turn = chat.submit(input).await?;
            if let Some(e) = &turn.image_failure {
                eprintln!("Image skipped: {e}");
            }
            match turn.failure {
                Some(e) => Err(e),
                None => {
                    println!("{}", turn.reply);
                    Ok(())
                }
            }
        }
        Commands::Session(args) => match args.command {
            SessionCommands::Ensure => {
                let handle = chat.ensure_session().await?;
                let verb = match handle.origin {
                    SessionOrigin::Created => "created",
                    SessionOrigin::Existing => "already exists",
                };
                println!("Session {} {verb}", handle.key);
                Ok(())
            }
            SessionCommands::Delete => {
                let key = chat.config().session_key();
                chat.end_session().await?;
                println!("Session {key} deleted");
                Ok(())
            }
        },
    }
}
