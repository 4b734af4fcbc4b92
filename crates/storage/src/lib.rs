#![forbid(unsafe_code)]

mod entry;
mod expire;
mod snapshot;
mod store;

pub use entry::{KeyInfo, Scalar};
pub use expire::Ttl;
pub use store::Store;
