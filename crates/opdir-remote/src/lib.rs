//! Remote access to an operator directory.
//!
//! - [`RecordSource`]: the RPC surface (`getRecords`, `getTip`,
//!   `submitRecords`), implemented over HTTP by [`JsonRpcSource`] and
//!   in-process by [`RecordLog`](opdir_log::RecordLog).
//! - [`RemoteDirectory`]: a caching, verifying follower with no datastore.
//! - [`Directory`]: the query/submit surface shared by the authoritative
//!   log and followers.
//! - [`wire`]: JSON-RPC 2.0 request/response types and error codes.

mod directory;
mod error;
mod jsonrpc;
mod remote;
mod source;
pub mod wire;

#[cfg(test)]
mod tests;

pub use directory::Directory;
pub use error::RemoteError;
pub use jsonrpc::JsonRpcSource;
pub use remote::{DEFAULT_CACHE_FOR, MAX_CACHE_FOR, RemoteDirectory};
pub use source::RecordSource;
