//! Configuration management for the followlist CLI

mod paths;
mod settings;

pub use paths::ConfigPaths;
pub use settings::Config;

/// Scope requested from the authorization server
pub const OAUTH_SCOPE: &str = "atproto transition:generic";

/// Name shown on the authorization screen
pub const CLIENT_NAME: &str = "Follows in List";
