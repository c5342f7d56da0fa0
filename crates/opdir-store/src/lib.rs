//! Append-only datastore backends.
//!
//! The directory log persists nothing but opaque [`DataEntry`] blobs through
//! the [`Datastore`] trait. Three backends are provided:
//!
//! - [`MemoryDatastore`]: volatile, shareable between logs in one process
//! - [`FileDatastore`]: length-prefixed frames in a single append-only file
//! - [`FjallDatastore`]: a fjall keyspace keyed by write time

mod config;
mod error;
mod file;
mod keyspace;
mod memory;
mod traits;

#[cfg(test)]
mod tests;

pub use config::DatastoreConfig;
pub use error::StoreError;
pub use file::FileDatastore;
pub use keyspace::FjallDatastore;
pub use memory::MemoryDatastore;
pub use traits::{DataEntry, Datastore};

/// Generate a random entry identifier of `len` bytes.
pub fn random_id(len: usize) -> Vec<u8> {
    use rand::RngCore;
    let mut id = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut id);
    id
}
