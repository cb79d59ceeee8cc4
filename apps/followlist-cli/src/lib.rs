//! followlist CLI library
//!
//! Everything behind the `followlist` binary: configuration, credential
//! storage, AT Protocol OAuth, the XRPC client and the commands. Exposed as a
//! library for integration testing.

pub mod api;
pub mod commands;
pub mod config;
pub mod credentials;
pub mod error;
pub mod logging;
pub mod models;
pub mod oauth;
pub mod output;
pub mod recent;

pub use error::{CliError, CliResult};
