//! Follows command - List the accounts you follow (or your followers)

use crate::api::{FollowersSource, FollowsSource};
use crate::commands::{api_client, drain};
use crate::error::CliResult;
use crate::oauth::SessionManager;
use crate::output::{print_account_table, print_json, print_status};
use clap::Args;

/// Arguments for the follows command
#[derive(Args)]
pub struct FollowsArgs {
    /// List your followers instead
    #[arg(long)]
    pub followers: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the follows command
pub async fn execute(args: FollowsArgs) -> CliResult<()> {
    let manager = SessionManager::from_defaults()?;
    let limits = manager.config().pagination_limits()?;
    let client = api_client(&manager).await?;
    let me = client.session().did().clone();

    let accounts = if args.followers {
        let source = FollowersSource {
            client: &client,
            actor: &me,
        };
        drain(&source, &limits, "followers", !args.json).await?
    } else {
        let source = FollowsSource {
            client: &client,
            actor: &me,
        };
        drain(&source, &limits, "follows", !args.json).await?
    };

    if args.json {
        return print_json(&accounts);
    }

    let what = if args.followers { "followers" } else { "follows" };
    print_status(&format!("Found {} {what}.", accounts.len()));
    println!();
    print_account_table(&accounts);
    Ok(())
}
