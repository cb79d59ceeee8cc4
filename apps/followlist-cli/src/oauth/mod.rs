//! AT Protocol OAuth: identity resolution, discovery, DPoP and sessions

pub mod callback;
pub mod client;
pub mod client_metadata;
pub mod discovery;
pub mod dpop;
pub mod pkce;
pub mod resolver;
pub mod session;

pub use callback::{CallbackParams, CallbackServer};
pub use client::OAuthClient;
pub use client_metadata::{metadata_router, ClientIdentity, ClientMetadata};
pub use dpop::{DpopKey, NonceCache};
pub use resolver::{IdentityResolver, ResolvedIdentity};
pub use session::{AuthSession, PendingLogin, SessionManager};
