//! Graph queries and their page sources

use crate::api::client::XrpcClient;
use crate::error::{CliError, CliResult};
use crate::models::{FollowersResponse, FollowsResponse, ListResponse, ResolveHandleResponse};
use async_trait::async_trait;
use followlist_core::{AccountSummary, AtUri, Did, Handle, HandleResolver, Page, PageSource};

pub const GET_FOLLOWS: &str = "app.bsky.graph.getFollows";
pub const GET_FOLLOWERS: &str = "app.bsky.graph.getFollowers";
pub const GET_LIST: &str = "app.bsky.graph.getList";
pub const RESOLVE_HANDLE: &str = "com.atproto.identity.resolveHandle";

fn page_params<'a>(
    key: &'static str,
    subject: &'a str,
    limit: &'a str,
    cursor: Option<&'a str>,
) -> Vec<(&'static str, &'a str)> {
    let mut params = vec![(key, subject), ("limit", limit)];
    if let Some(cursor) = cursor {
        params.push(("cursor", cursor));
    }
    params
}

impl XrpcClient {
    /// One page of accounts `actor` follows
    pub async fn get_follows(
        &self,
        actor: &Did,
        cursor: Option<&str>,
        limit: u32,
    ) -> CliResult<FollowsResponse> {
        let limit = limit.to_string();
        self.query(GET_FOLLOWS, &page_params("actor", actor.as_str(), &limit, cursor))
            .await
    }

    /// One page of accounts following `actor`
    pub async fn get_followers(
        &self,
        actor: &Did,
        cursor: Option<&str>,
        limit: u32,
    ) -> CliResult<FollowersResponse> {
        let limit = limit.to_string();
        self.query(GET_FOLLOWERS, &page_params("actor", actor.as_str(), &limit, cursor))
            .await
    }

    /// One page of a list's members
    pub async fn get_list(
        &self,
        list: &AtUri,
        cursor: Option<&str>,
        limit: u32,
    ) -> CliResult<ListResponse> {
        let uri = list.to_string();
        let limit = limit.to_string();
        self.query(GET_LIST, &page_params("list", &uri, &limit, cursor))
            .await
    }

    /// Resolve a handle through the PDS
    pub async fn resolve_handle(&self, handle: &Handle) -> CliResult<Did> {
        let response: ResolveHandleResponse = self
            .query(RESOLVE_HANDLE, &[("handle", handle.as_str())])
            .await
            .map_err(|e| match e {
                CliError::Api { message, .. } | CliError::NotFound(message) => {
                    CliError::Resolution(format!("{handle}: {message}"))
                }
                other => other,
            })?;
        Ok(response.did)
    }
}

#[async_trait]
impl HandleResolver for XrpcClient {
    type Error = CliError;

    async fn resolve_handle(&self, handle: &Handle) -> Result<Did, CliError> {
        XrpcClient::resolve_handle(self, handle).await
    }
}

/// Accounts an actor follows
pub struct FollowsSource<'a> {
    pub client: &'a XrpcClient,
    pub actor: &'a Did,
}

#[async_trait]
impl<'a> PageSource for FollowsSource<'a> {
    type Item = AccountSummary;
    type Error = CliError;

    async fn fetch_page(
        &self,
        cursor: Option<&str>,
        limit: u32,
    ) -> CliResult<Page<AccountSummary>> {
        let response = self.client.get_follows(self.actor, cursor, limit).await?;
        Ok(Page::new(response.follows, response.cursor))
    }
}

/// Accounts following an actor
pub struct FollowersSource<'a> {
    pub client: &'a XrpcClient,
    pub actor: &'a Did,
}

#[async_trait]
impl<'a> PageSource for FollowersSource<'a> {
    type Item = AccountSummary;
    type Error = CliError;

    async fn fetch_page(
        &self,
        cursor: Option<&str>,
        limit: u32,
    ) -> CliResult<Page<AccountSummary>> {
        let response = self.client.get_followers(self.actor, cursor, limit).await?;
        Ok(Page::new(response.followers, response.cursor))
    }
}

/// Members of a list
pub struct ListMembersSource<'a> {
    pub client: &'a XrpcClient,
    pub list: &'a AtUri,
}

#[async_trait]
impl<'a> PageSource for ListMembersSource<'a> {
    type Item = AccountSummary;
    type Error = CliError;

    async fn fetch_page(
        &self,
        cursor: Option<&str>,
        limit: u32,
    ) -> CliResult<Page<AccountSummary>> {
        let response = self.client.get_list(self.list, cursor, limit).await?;
        let members = response.items.into_iter().map(|item| item.subject).collect();
        Ok(Page::new(members, response.cursor))
    }
}
