//! The four submission strategies.

mod async_queue;
mod direct;
mod disabled;
mod pooled;

pub use async_queue::AsyncQueueBackend;
pub use direct::DirectBackend;
pub use disabled::DisabledBackend;
pub use pooled::PooledBackend;
