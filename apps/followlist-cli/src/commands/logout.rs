//! Logout command - Revoke tokens and clear local state

use crate::error::CliResult;
use crate::oauth::SessionManager;
use crate::output::{print_info, print_success};
use clap::Args;

/// Arguments for the logout command
#[derive(Args)]
pub struct LogoutArgs {}

/// Execute the logout command
pub async fn execute(_args: LogoutArgs) -> CliResult<()> {
    let manager = SessionManager::from_defaults()?;

    if manager.terminate_session().await? {
        print_success("Logged out. Local session data cleared.");
    } else {
        print_info("You are not logged in.");
    }
    Ok(())
}
