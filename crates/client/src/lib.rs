//! HTTP client for the GoodVibes API.
//!
//! [`RemoteStore`] implements the core [`ProjectStore`] and [`AuthGateway`]
//! traits over `goodvibes-api`, so the voting view, submission form and
//! moderation console run unchanged against the real service.
//!
//! [`ProjectStore`]: goodvibes_core::store::ProjectStore
//! [`AuthGateway`]: goodvibes_core::auth::AuthGateway

pub mod config;
pub mod error;
pub mod remote;

pub use config::{storage_from_env, ClientConfig};
pub use error::ClientError;
pub use remote::{connect, RemoteStore};
