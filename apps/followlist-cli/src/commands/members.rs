//! Members command - List the members of a list

use crate::api::ListMembersSource;
use crate::commands::{api_client, drain};
use crate::error::CliResult;
use crate::oauth::SessionManager;
use crate::output::{print_account_table, print_handles, print_json, print_status};
use clap::Args;
use followlist_core::ListReference;

/// Arguments for the members command
#[derive(Args)]
pub struct MembersArgs {
    /// List URL (https://bsky.app/profile/<handle>/lists/<id>) or at:// identifier
    pub list: String,

    /// Output as JSON
    #[arg(long, conflicts_with = "handles")]
    pub json: bool,

    /// Print only member handles, one per line
    #[arg(long)]
    pub handles: bool,
}

/// Execute the members command
pub async fn execute(args: MembersArgs) -> CliResult<()> {
    let manager = SessionManager::from_defaults()?;
    let reference = ListReference::parse_with_hosts(&args.list, &manager.config().web_hosts)?;
    let limits = manager.config().pagination_limits()?;
    let client = api_client(&manager).await?;

    let list = reference.resolve(&client).await?;
    let interactive = !args.json && !args.handles;
    let members = drain(
        &ListMembersSource {
            client: &client,
            list: &list,
        },
        &limits,
        "list members",
        interactive,
    )
    .await?;

    if args.json {
        return print_json(&members);
    }
    if args.handles {
        print_handles(&members);
        return Ok(());
    }

    print_status(&format!("{list} has {} members.", members.len()));
    println!();
    print_account_table(&members);
    Ok(())
}
