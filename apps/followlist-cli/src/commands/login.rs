//! Login command - AT Protocol OAuth in the browser

use crate::error::{CliError, CliResult};
use crate::oauth::SessionManager;
use crate::output::{print_info, print_success};
use crate::recent::load_recent;
use clap::Args;

/// Arguments for the login command
#[derive(Args)]
pub struct LoginArgs {
    /// Your handle (e.g. alice.bsky.social) or DID; defaults to the last one used
    pub handle: Option<String>,

    /// Don't automatically open the browser
    #[arg(long)]
    pub no_browser: bool,

    /// Loopback port for the sign-in redirect (0 picks a free port)
    #[arg(long)]
    pub port: Option<u16>,
}

/// Execute the login command
pub async fn execute(args: LoginArgs) -> CliResult<()> {
    let manager = SessionManager::from_defaults()?;

    if let Some(existing) = manager.resume_session().await {
        print_info(&format!(
            "You are already logged in as {}. Run 'followlist logout' first to switch accounts.",
            existing.session.display_name()
        ));
        return Ok(());
    }

    let input = match args.handle {
        Some(handle) => handle,
        None => load_recent(manager.paths(), manager.config().recent_handles_limit)
            .latest()
            .map(ToString::to_string)
            .ok_or_else(|| {
                CliError::Validation(
                    "Enter your handle, e.g. 'followlist login alice.bsky.social'".to_string(),
                )
            })?,
    };

    let port = args.port.unwrap_or(manager.config().callback_port);
    let no_browser = args.no_browser;

    print_info(&format!("Signing in as {}...", input.trim()));
    let session = manager
        .initiate_login(&input, port, |url| present_authorization_url(url, no_browser))
        .await?;

    println!();
    print_success(&format!(
        "Logged in as {}",
        session.session.display_name()
    ));
    Ok(())
}

fn present_authorization_url(url: &str, no_browser: bool) {
    println!();
    println!("To sign in, visit:");
    println!("  {url}");
    println!();

    if !no_browser {
        if open::that(url).is_ok() {
            print_info("Browser opened. Complete sign-in there.");
        } else {
            print_info("Could not open browser. Please visit the URL above manually.");
        }
    }
    print_info("Waiting for the browser to redirect back...");
}
