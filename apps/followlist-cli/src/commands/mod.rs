//! CLI command implementations

pub mod check;
pub mod client_metadata;
pub mod follows;
pub mod login;
pub mod logout;
pub mod members;
pub mod recent;
pub mod whoami;

use crate::api::XrpcClient;
use crate::error::{CliError, CliResult};
use crate::oauth::SessionManager;
use crate::output::FetchSpinner;
use followlist_core::{fetch_all_with_progress, PageSource, PaginationLimits};

/// API client for the stored session, or `NotAuthenticated`
pub(crate) async fn api_client(manager: &SessionManager) -> CliResult<XrpcClient> {
    let session = manager.require_session().await?;
    Ok(XrpcClient::new(
        manager.http().clone(),
        session,
        manager.config().appview.clone(),
    ))
}

/// Drain a collection behind a spinner
pub async fn drain<S>(
    source: &S,
    limits: &PaginationLimits,
    what: &str,
    show_progress: bool,
) -> CliResult<Vec<S::Item>>
where
    S: PageSource<Error = CliError>,
{
    let spinner = FetchSpinner::start(what, show_progress);
    let result = fetch_all_with_progress(source, limits, |progress| spinner.update(progress)).await;
    spinner.finish();
    Ok(result?)
}
