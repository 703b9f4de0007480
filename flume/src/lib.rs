//! The [`Handoff`](handoff::Handoff) contract on top of a zero-capacity
//! [`flume`] channel.

pub mod rendezvous;
pub use rendezvous::FlumeRendezvous;
