//! XRPC client for the user's PDS

mod client;
mod graph;

pub use client::{XrpcClient, PROXY_HEADER};
pub use graph::{
    FollowersSource, FollowsSource, ListMembersSource, GET_FOLLOWERS, GET_FOLLOWS, GET_LIST,
    RESOLVE_HANDLE,
};
