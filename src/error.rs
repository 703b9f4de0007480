use thiserror::Error;

/// Failure of a blocking channel operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ChannelError {
    /// The channel was closed before the operation could complete.
    #[error("rendezvous channel has been closed")]
    Closed,
    /// The deadline passed before a peer showed up.
    #[error("timed out waiting on rendezvous channel")]
    Timeout,
}

/// Failure of [`try_recv`](crate::RendezvousChannel::try_recv).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum TryRecvError {
    #[error("no value has been published")]
    Empty,
    #[error("rendezvous channel has been closed")]
    Closed,
}
