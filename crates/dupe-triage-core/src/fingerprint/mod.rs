mod cache;
mod digest;

pub use cache::FingerprintCache;
pub use digest::{compute, BLOCK_SIZE};
