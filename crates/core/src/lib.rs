//! GoodVibes idea board core.
//!
//! Domain types and the client-side state machines of the platform:
//! anonymous device identity, the local vote ledger, the step-gated
//! submission form, the voting view and the moderation console. The
//! remote data store is reached only through the [`store::ProjectStore`]
//! and [`auth::AuthGateway`] traits.

pub mod auth;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod memory;
pub mod moderation;
pub mod project;
pub mod storage;
pub mod store;
pub mod submission;
pub mod types;
pub mod voting;
