//! Export worker: the streaming CSV export runner and the job
//! dispatcher that drives it off the durable queue.

pub mod config;
pub mod dispatcher;
pub mod export;
