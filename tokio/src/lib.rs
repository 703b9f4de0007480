//! Async access to [`Handoff`](handoff::Handoff) channels from tokio tasks.

pub mod task;
pub use task::{AsyncHandoff, AsyncHandoffError};
