//! followlist - Check which accounts you follow are on a Bluesky list
//!
//! This CLI lets you:
//! - Sign in with your Bluesky account (AT Protocol OAuth)
//! - Compare your follows (and followers) against a curation or moderation list
//! - Inspect your follows and a list's members
//! - Publish the OAuth client-metadata document for a hosted deployment

use clap::{Parser, Subcommand};
use followlist_cli::commands;
use followlist_cli::error::CliResult;
use followlist_cli::logging::init_logging;

/// followlist - Which accounts you follow are on a list
#[derive(Parser)]
#[command(name = "followlist")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Write logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with your Bluesky account
    Login(commands::login::LoginArgs),

    /// Revoke tokens and clear local session data
    Logout(commands::logout::LogoutArgs),

    /// Display the current session
    Whoami(commands::whoami::WhoamiArgs),

    /// Check which accounts you follow are on a list
    Check(commands::check::CheckArgs),

    /// List the accounts you follow
    Follows(commands::follows::FollowsArgs),

    /// List the members of a list
    Members(commands::members::MembersArgs),

    /// Show or clear recently used handles
    Recent(commands::recent::RecentArgs),

    /// Print or serve the OAuth client-metadata document
    ClientMetadata(commands::client_metadata::ClientMetadataArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json);

    let result = run(cli.command).await;

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            e.print();
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(command: Commands) -> CliResult<()> {
    match command {
        Commands::Login(args) => commands::login::execute(args).await,
        Commands::Logout(args) => commands::logout::execute(args).await,
        Commands::Whoami(args) => commands::whoami::execute(args).await,
        Commands::Check(args) => commands::check::execute(args).await,
        Commands::Follows(args) => commands::follows::execute(args).await,
        Commands::Members(args) => commands::members::execute(args).await,
        Commands::Recent(args) => commands::recent::execute(args).await,
        Commands::ClientMetadata(args) => commands::client_metadata::execute(args).await,
    }
}
