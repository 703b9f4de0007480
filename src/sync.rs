//! Rendezvous channels and the [`Handoff`] seam they share.

mod rendezvous;
pub mod split;

pub use rendezvous::RendezvousChannel;
pub use split::{channel, Receiver, Sender};

use crate::error::ChannelError;
use crate::time::Timeout;

/// A blocking single-slot handoff of `i32` values between one sender and
/// one receiver.
///
/// `send` returns only after a receiver took the value. Closing releases
/// every waiter with [`ChannelError::Closed`].
pub trait Handoff: Send + Sync {
    fn send_timeout(&self, value: i32, timeout: Timeout) -> Result<(), ChannelError>;

    fn recv_timeout(&self, timeout: Timeout) -> Result<i32, ChannelError>;

    /// Idempotent.
    fn close(&self);

    fn is_closed(&self) -> bool;

    fn send(&self, value: i32) -> Result<(), ChannelError> {
        self.send_timeout(value, Timeout::Infinite)
    }

    fn recv(&self) -> Result<i32, ChannelError> {
        self.recv_timeout(Timeout::Infinite)
    }
}
