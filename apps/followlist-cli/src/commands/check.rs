//! Check command - Which accounts you follow are on a list

use crate::api::{FollowersSource, FollowsSource, ListMembersSource, XrpcClient};
use crate::commands::{api_client, drain};
use crate::error::CliResult;
use crate::oauth::SessionManager;
use crate::output::{
    print_account_table, print_handles, print_header, print_info, print_json, print_status,
    print_success,
};
use clap::Args;
use followlist_core::{
    AccountSummary, AtUri, ListReference, Matches, MembershipSet, PaginationLimits, Workflow,
};
use serde::Serialize;
use std::collections::HashSet;
use tracing::info;

/// Arguments for the check command
#[derive(Args)]
pub struct CheckArgs {
    /// List URL (https://bsky.app/profile/<handle>/lists/<id>) or at:// identifier
    pub list: String,

    /// Also check your followers
    #[arg(long)]
    pub followers: bool,

    /// Output as JSON
    #[arg(long, conflicts_with = "handles")]
    pub json: bool,

    /// Print only matching handles, one per line
    #[arg(long)]
    pub handles: bool,
}

/// Outcome of one check
#[derive(Debug, Clone)]
pub struct CheckReport {
    /// Canonical list identifier
    pub list: AtUri,
    /// Accounts followed
    pub follows: usize,
    /// Followers, when checked
    pub followers: Option<usize>,
    /// Distinct list members
    pub members: usize,
    /// Matched accounts
    pub matches: Matches,
}

/// How a check reports progress
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckDisplay {
    /// Print status lines
    pub status: bool,
    /// Show spinners while draining
    pub progress: bool,
}

/// Run the check workflow against `client`'s session
pub async fn run_check(
    client: &XrpcClient,
    reference: ListReference,
    include_followers: bool,
    limits: &PaginationLimits,
    display: CheckDisplay,
) -> CliResult<CheckReport> {
    let status = |message: &str| {
        if display.status {
            print_status(message);
        }
    };

    let me = client.session().did().clone();
    let mut workflow = Workflow::new();
    workflow.login(me.clone())?;

    status("Fetching your follows...");
    let follows = drain(
        &FollowsSource {
            client,
            actor: &me,
        },
        limits,
        "follows",
        display.progress,
    )
    .await?;

    let followers = if include_followers {
        status(&format!(
            "Found {} follows. Fetching your followers...",
            follows.len()
        ));
        let followers = drain(
            &FollowersSource {
                client,
                actor: &me,
            },
            limits,
            "followers",
            display.progress,
        )
        .await?;
        Some(followers)
    } else {
        None
    };

    let follows_count = follows.len();
    let followers_count = followers.as_ref().map(Vec::len);
    workflow.fetch_follows(follows, followers)?;

    match followers_count {
        Some(n) => status(&format!(
            "Found {follows_count} follows and {n} followers. Fetching list members..."
        )),
        None => status(&format!(
            "Found {follows_count} follows. Fetching list members..."
        )),
    }

    let list = reference.resolve(client).await?;
    let members = drain(
        &ListMembersSource {
            client,
            list: &list,
        },
        limits,
        "list members",
        display.progress,
    )
    .await?;
    let membership: MembershipSet = members.into_iter().map(|m| m.did).collect();
    let member_count = membership.len();
    workflow.fetch_list(membership)?;

    status(&format!("List has {member_count} members. Comparing..."));
    let matches = workflow.compare()?.clone();
    info!(list = %list, matches = matches.total(), "Check complete");

    Ok(CheckReport {
        list,
        follows: follows_count,
        followers: followers_count,
        members: member_count,
        matches,
    })
}

/// JSON output for check
#[derive(Serialize)]
struct CheckOutput<'a> {
    list: String,
    follows_checked: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    followers_checked: Option<usize>,
    list_members: usize,
    matches: &'a [AccountSummary],
    #[serde(skip_serializing_if = "Option::is_none")]
    follower_matches: Option<&'a [AccountSummary]>,
}

impl<'a> From<&'a CheckReport> for CheckOutput<'a> {
    fn from(report: &'a CheckReport) -> Self {
        Self {
            list: report.list.to_string(),
            follows_checked: report.follows,
            followers_checked: report.followers,
            list_members: report.members,
            matches: &report.matches.follows,
            follower_matches: report.matches.followers.as_deref(),
        }
    }
}

/// Execute the check command
pub async fn execute(args: CheckArgs) -> CliResult<()> {
    let manager = SessionManager::from_defaults()?;
    let reference = ListReference::parse_with_hosts(&args.list, &manager.config().web_hosts)?;
    let limits = manager.config().pagination_limits()?;
    let client = api_client(&manager).await?;

    let interactive = !args.json && !args.handles;
    let report = run_check(
        &client,
        reference,
        args.followers,
        &limits,
        CheckDisplay {
            status: interactive,
            progress: interactive,
        },
    )
    .await?;

    if args.json {
        return print_json(&CheckOutput::from(&report));
    }

    if args.handles {
        print_handles(distinct_matches(&report.matches));
        return Ok(());
    }

    print_report(&report);
    Ok(())
}

/// Matched follows, then matched followers not already listed
fn distinct_matches(matches: &Matches) -> Vec<&AccountSummary> {
    let mut seen = HashSet::new();
    matches
        .follows
        .iter()
        .chain(matches.followers.iter().flatten())
        .filter(|account| seen.insert(&account.did))
        .collect()
}

fn print_report(report: &CheckReport) {
    let total = report.matches.total();
    if total == 0 {
        print_info("No matches found.");
        return;
    }

    print_success(&format!("Found {total} matches!"));

    match &report.matches.followers {
        None => {
            println!();
            print_account_table(&report.matches.follows);
        }
        Some(followers) => {
            print_header(&format!("Follows on the list ({})", report.matches.follows.len()));
            print_account_table(&report.matches.follows);
            print_header(&format!("Followers on the list ({})", followers.len()));
            print_account_table(followers);
        }
    }
    println!();
}
