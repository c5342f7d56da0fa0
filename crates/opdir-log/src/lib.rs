//! Authoritative operator directory log.
//!
//! The log keeps no state of its own beyond what it can re-derive: every
//! update reads all stored records, rebuilds every hash-linked chain
//! ([`RecordGraph`]), verifies each one and selects a single authoritative
//! chain ([`resolve`]), then projects it into per-operator
//! [`DirectoryEntry`](opdir_types::DirectoryEntry) values.
//!
//! **Fork resolution**: a chain is cut at its first record that fails
//! verification. Among the surviving chains the one whose root was created
//! last wins; on a tie the chain examined first (storage order) is kept.
//! Losing records stay in storage but have no authority.

mod chain;
mod error;
mod log;
mod projection;
mod resolver;

#[cfg(test)]
mod tests;

pub use chain::{Chain, RecordGraph};
pub use error::LogError;
pub use log::{RecordLog, SIGNED_CHANGE_RECORD};
pub use projection::project;
pub use resolver::{Resolution, resolve, valid_prefix};
