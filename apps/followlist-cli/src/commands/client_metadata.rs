//! Client-metadata command - Print or serve the OAuth client document

use crate::error::{CliError, CliResult};
use crate::oauth::client_metadata::{METADATA_ALT_PATH, METADATA_PATH};
use crate::oauth::{metadata_router, ClientMetadata};
use crate::output::{print_info, print_json};
use clap::Args;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

/// Arguments for the client-metadata command
#[derive(Args)]
pub struct ClientMetadataArgs {
    /// Public origin of the deployment (e.g. https://followlist.example);
    /// when serving without it, the origin comes from request headers
    #[arg(long, required_unless_present = "serve")]
    pub origin: Option<String>,

    /// Also list the loopback redirect for this port (for `followlist login`)
    #[arg(long)]
    pub port: Option<u16>,

    /// Serve the document on this address instead of printing it
    #[arg(long, value_name = "ADDR")]
    pub serve: Option<SocketAddr>,
}

/// Execute the client-metadata command
pub async fn execute(args: ClientMetadataArgs) -> CliResult<()> {
    let origin = args.origin.map(|o| o.trim_end_matches('/').to_string());

    let Some(addr) = args.serve else {
        let origin = origin.ok_or_else(|| {
            CliError::Validation("--origin is required unless --serve is given".to_string())
        })?;
        return print_json(&ClientMetadata::for_origin(&origin, args.port));
    };

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| CliError::Config(format!("Cannot listen on {addr}: {e}")))?;
    let local = listener.local_addr()?;

    print_info(&format!(
        "Serving client metadata on http://{local}{METADATA_PATH} and {METADATA_ALT_PATH}"
    ));
    info!(%local, origin = ?origin, "Client metadata endpoint started");

    axum::serve(listener, metadata_router(origin, args.port))
        .await
        .map_err(|e| CliError::Io(e.to_string()))
}
