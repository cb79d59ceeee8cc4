//! Whoami command - Display the current session

use crate::error::{CliError, CliResult};
use crate::oauth::{AuthSession, SessionManager};
use crate::output::{print_json, print_key_value};
use clap::Args;
use serde::Serialize;

/// Arguments for the whoami command
#[derive(Args)]
pub struct WhoamiArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// JSON output for whoami
#[derive(Serialize)]
struct WhoamiOutput {
    did: String,
    handle: Option<String>,
    pds: String,
    issuer: String,
    token_expires_at: String,
    credential_store: &'static str,
}

impl WhoamiOutput {
    fn new(auth: &AuthSession, credential_store: &'static str) -> Self {
        Self {
            did: auth.did().to_string(),
            handle: auth.handle().map(ToString::to_string),
            pds: auth.pds_url().to_string(),
            issuer: auth.session.issuer.clone(),
            token_expires_at: auth.credentials.expires_at.to_rfc3339(),
            credential_store,
        }
    }
}

/// Execute the whoami command
pub async fn execute(args: WhoamiArgs) -> CliResult<()> {
    let manager = SessionManager::from_defaults()?;
    let auth = manager
        .resume_session()
        .await
        .ok_or(CliError::NotAuthenticated)?;

    let output = WhoamiOutput::new(&auth, manager.credential_backend());
    if args.json {
        return print_json(&output);
    }

    println!();
    print_key_value("DID", &output.did);
    print_key_value("Handle", output.handle.as_deref().unwrap_or("(unknown)"));
    print_key_value("PDS", &output.pds);
    print_key_value("Authorization server", &output.issuer);
    print_key_value("Token expires", &output.token_expires_at);
    print_key_value("Credentials stored in", output.credential_store);
    println!();
    Ok(())
}
