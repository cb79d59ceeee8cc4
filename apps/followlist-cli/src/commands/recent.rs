//! Recent command - Show or clear recently used handles

use crate::config::{Config, ConfigPaths};
use crate::error::CliResult;
use crate::output::{print_info, print_success};
use crate::recent::{clear_recent, load_recent};
use clap::Args;

/// Arguments for the recent command
#[derive(Args)]
pub struct RecentArgs {
    /// Forget all recent handles
    #[arg(long)]
    pub clear: bool,
}

/// Execute the recent command
pub async fn execute(args: RecentArgs) -> CliResult<()> {
    let paths = ConfigPaths::new()?;

    if args.clear {
        clear_recent(&paths)?;
        print_success("Recent handles cleared.");
        return Ok(());
    }

    let config = Config::load(&paths)?;
    let recent = load_recent(&paths, config.recent_handles_limit);
    if recent.is_empty() {
        print_info("No recent handles.");
        return Ok(());
    }

    for handle in recent.handles() {
        println!("@{handle}");
    }
    Ok(())
}
