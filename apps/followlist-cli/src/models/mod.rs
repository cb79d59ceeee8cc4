//! Data models for the followlist CLI

pub mod credentials;
pub mod graph;
pub mod identity;
pub mod oauth_metadata;
pub mod session;
pub mod token;

pub use credentials::Credentials;
pub use graph::{FollowersResponse, FollowsResponse, ListItem, ListResponse, XrpcErrorBody};
pub use identity::{DidDocument, DidService, ResolveHandleResponse};
pub use oauth_metadata::{AuthServerMetadata, ParResponse, ProtectedResourceMetadata};
pub use session::Session;
pub use token::{OAuthError, TokenResponse};
