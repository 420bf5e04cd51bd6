//! # vigil-ingest
//!
//! The pluggable ingestion backend. A submission enters through one of
//! four interchangeable strategies (direct, pooled, async queue,
//! disabled), selected once at process start by the factory; the async
//! strategy hands work to a durable task broker drained by a worker.

pub mod backend;
pub mod factory;
pub mod queue;
pub mod telemetry;

pub use backend::{AsyncQueueBackend, DirectBackend, DisabledBackend, PooledBackend};
pub use queue::broker::SqliteBroker;
pub use queue::worker::IngestWorker;
