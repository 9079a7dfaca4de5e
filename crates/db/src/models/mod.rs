//! Database row structs.
//!
//! Rows mirror the table columns with plain SQL types; conversions into the
//! `goodvibes-core` domain types live next to each row.

pub mod moderator;
pub mod project;
